//! Tracing setup for the binary.
//!
//! The TUI owns the terminal, so nothing is logged there unless asked for.
//! `--debug-log` or `RUST_LOG` sends logs to stderr (redirect it to a file
//! when running the TUI); pipe mode logs warnings to stderr by default.

use crate::config::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEBUG_FILTER: &str = "mandir=debug,warn";
const PIPE_FILTER: &str = "warn";

/// The filter to install, or `None` to leave logging off.
pub fn filter_directives(config: &Config, rust_log: Option<&str>) -> Option<String> {
    if let Some(directives) = rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(directives.to_string());
    }
    if config.debug_log {
        Some(DEBUG_FILTER.to_string())
    } else if config.pipe {
        Some(PIPE_FILTER.to_string())
    } else {
        None
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(config: &Config) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let Some(directives) = filter_directives(config, rust_log.as_deref()) else {
        return;
    };
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(PIPE_FILTER));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false);

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(%directives, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_is_silent_by_default() {
        assert_eq!(filter_directives(&Config::default(), None), None);
    }

    #[test]
    fn pipe_logs_warnings_and_debug_flag_wins() {
        let pipe = Config {
            pipe: true,
            ..Config::default()
        };
        assert_eq!(filter_directives(&pipe, None).as_deref(), Some("warn"));

        let debug = Config {
            pipe: true,
            debug_log: true,
            ..Config::default()
        };
        assert_eq!(filter_directives(&debug, None).as_deref(), Some(DEBUG_FILTER));
    }

    #[test]
    fn rust_log_overrides_flags() {
        assert_eq!(
            filter_directives(&Config::default(), Some("mandir::session=trace")).as_deref(),
            Some("mandir::session=trace")
        );
        assert_eq!(filter_directives(&Config::default(), Some("  ")), None);
    }
}
