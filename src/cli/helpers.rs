//! Shared helper functions for CLI commands.

use std::time::Duration;

use console::{style, StyledObject};

use crate::models::AnalysisStatus;

pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

pub fn warning() -> StyledObject<&'static str> {
    style("!").yellow()
}

pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

/// Status label colored by outcome.
pub fn status_label(status: AnalysisStatus) -> StyledObject<&'static str> {
    match status {
        AnalysisStatus::Complete => style(status.as_str()).green(),
        AnalysisStatus::Partial => style(status.as_str()).yellow(),
        AnalysisStatus::Failed => style(status.as_str()).red(),
    }
}

/// Truncate to `max_chars` characters, appending "..." when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// Parse a `key=value` argument.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer name.pdf", 10), "a much ...");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("summary_type = brief"),
            Ok(("summary_type".to_string(), "brief".to_string()))
        );
        assert!(parse_key_value("summary_type").is_err());
        assert!(parse_key_value("=brief").is_err());
    }
}
