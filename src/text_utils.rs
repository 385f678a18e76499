// src/text_utils.rs
// Utility functions for text formatting

use once_cell::sync::Lazy;
use regex::Regex;

// `m:ss`, `h:mm:ss` or plain seconds, optionally fractional
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:(\d+):)?(\d+):)?(\d+(?:\.\d+)?)$").unwrap()
});

/// Wrap text to a given width, breaking at word boundaries. Explicit line
/// breaks in `text` are kept.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// Format seconds as `m:ss` (or `h:mm:ss` past an hour). Non-finite and
/// negative values show as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Parse a position typed by the user: `90`, `1:30`, `1:02:03`, `12.5`.
pub fn parse_time(input: &str) -> Option<f64> {
    let caps = TIME_RE.captures(input.trim())?;
    let part = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    Some(part(1) * 3600.0 + part(2) * 60.0 + part(3))
}
