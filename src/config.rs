// config.rs: command line configuration

use crate::content::{ContentError, ContentRoot};
use clap::Parser;

/// Environment variable consulted when `--content` is not given.
pub const CONTENT_ENV: &str = "MANDIR_CONTENT";
pub const DEFAULT_CONTENT: &str = "./public";

/// Application configuration from CLI
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about)]
pub struct Config {
    /// Content root: a directory holding the JSON documents and audio files,
    /// or an http(s) base URL serving them. Falls back to $MANDIR_CONTENT,
    /// then ./public.
    #[arg(long, value_name = "DIR|URL")]
    pub content: Option<String>,
    /// Line-oriented mode: read commands from stdin, print events to stdout
    #[arg(long)]
    pub pipe: bool,
    /// Log debug output to stderr
    #[arg(long)]
    pub debug_log: bool,
    /// Track length reported by the silent output, in seconds (0 = unknown)
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub silent_length: f64,
    /// Play through the system audio device
    #[cfg(feature = "audio")]
    #[arg(long)]
    pub device: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content: None,
            pipe: false,
            debug_log: false,
            silent_length: 0.0,
            #[cfg(feature = "audio")]
            device: false,
        }
    }
}

impl Config {
    /// Fill in the content root from the environment if the CLI left it out.
    pub fn content_from_env_if_empty(&mut self) {
        self.apply_content_fallback(std::env::var(CONTENT_ENV).ok());
    }

    fn apply_content_fallback(&mut self, env_value: Option<String>) {
        if self.content.is_none()
            && let Some(value) = env_value.map(|v| v.trim().to_string())
            && !value.is_empty()
        {
            self.content = Some(value);
        }
    }

    pub fn content_root(&self) -> Result<ContentRoot, ContentError> {
        ContentRoot::parse(self.content.as_deref().unwrap_or(DEFAULT_CONTENT))
    }

    /// Nominal track length for the silent output; `None` when unknown.
    pub fn nominal_length(&self) -> Option<f64> {
        Some(self.silent_length).filter(|l| l.is_finite() && *l > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_match_cli_defaults() {
        let parsed = Config::parse_from(["mandir"]);
        assert_eq!(parsed, Config::default());
        assert_eq!(
            parsed.content_root().unwrap(),
            ContentRoot::Dir(PathBuf::from("./public"))
        );
        assert_eq!(parsed.nominal_length(), None);
    }

    #[test]
    fn flags_are_parsed() {
        let cfg = Config::parse_from([
            "mandir",
            "--content",
            "https://example.org/site",
            "--pipe",
            "--silent-length",
            "240",
        ]);
        assert!(cfg.pipe);
        assert_eq!(cfg.nominal_length(), Some(240.0));
        assert!(matches!(cfg.content_root().unwrap(), ContentRoot::Http(_)));
    }

    #[test]
    fn env_fallback_only_fills_missing_content() {
        let mut cfg = Config::default();
        cfg.apply_content_fallback(Some("  ".to_string()));
        assert_eq!(cfg.content, None);
        cfg.apply_content_fallback(Some("/srv/mandir".to_string()));
        assert_eq!(cfg.content.as_deref(), Some("/srv/mandir"));
        cfg.apply_content_fallback(Some("/other".to_string()));
        assert_eq!(cfg.content.as_deref(), Some("/srv/mandir"));
    }
}
