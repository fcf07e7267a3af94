//! Duration and clock-time formatting.
//!
//! Everything here works on whole seconds. The compact format is the one
//! used inside captions: no zero-padded hour component, `M:SS` below one
//! hour and `H:MM:SS` above.

use crate::error::{Result, Ytb2AudioError};

/// Format seconds as `M:SS` or `H:MM:SS`.
///
/// `0` → `0:00`, `65` → `1:05`, `3725` → `1:02:05`.
pub fn format_compact(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format seconds as a zero-padded `HH:MM:SS` clock, as used in transcripts.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format duration in seconds to a human-readable string (`1h 2m 5s`).
pub fn format_human(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Parse a clock token (`M:SS`, `MM:SS` or `H:MM:SS`) into seconds.
///
/// Minutes and seconds must be below 60 and hours below 24; anything else
/// is rejected.
pub fn parse_clock(token: &str) -> Result<u64> {
    let reject = || Ytb2AudioError::UnparseableTimecode(token.to_string());

    let parts: Vec<&str> = token.trim().split(':').collect();
    let numbers = parts
        .iter()
        .map(|p| {
            if p.is_empty() || p.len() > 2 || !p.chars().all(|c| c.is_ascii_digit()) {
                None
            } else {
                p.parse::<u64>().ok()
            }
        })
        .collect::<Option<Vec<u64>>>()
        .ok_or_else(reject)?;

    match numbers.as_slice() {
        [m, s] if *m < 60 && *s < 60 => Ok(m * 60 + s),
        [h, m, s] if *h < 24 && *m < 60 && *s < 60 => Ok(h * 3600 + m * 60 + s),
        _ => Err(reject()),
    }
}

/// Parse a user-supplied time: either a clock token or a plain number of seconds.
pub fn parse_time_arg(value: &str) -> Result<u64> {
    let value = value.trim();
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return value
            .parse::<u64>()
            .map_err(|_| Ytb2AudioError::InvalidInput(format!("Invalid time: {}", value)));
    }
    parse_clock(value).map_err(|_| Ytb2AudioError::InvalidInput(format!("Invalid time: {}", value)))
}

/// Rough estimate of how long downloading a video of this length takes.
pub fn predict_download_seconds(duration_seconds: u64) -> u64 {
    // Empirical: ~1/25 of play time plus connection overhead.
    duration_seconds / 25 + 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(0), "0:00");
        assert_eq!(format_compact(9), "0:09");
        assert_eq!(format_compact(65), "1:05");
        assert_eq!(format_compact(600), "10:00");
        assert_eq!(format_compact(3600), "1:00:00");
        assert_eq!(format_compact(3725), "1:02:05");
        assert_eq!(format_compact(36000), "10:00:00");
    }

    #[test]
    fn test_format_human() {
        assert_eq!(format_human(5), "5s");
        assert_eq!(format_human(125), "2m 5s");
        assert_eq!(format_human(3725), "1h 2m 5s");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3661), "01:01:01");
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("2:05").unwrap(), 125);
        assert_eq!(parse_clock("02:05").unwrap(), 125);
        assert_eq!(parse_clock("0:00").unwrap(), 0);
        assert_eq!(parse_clock("1:02:05").unwrap(), 3725);
        assert_eq!(parse_clock("01:02:05").unwrap(), 3725);
    }

    #[test]
    fn test_parse_clock_rejects() {
        assert!(parse_clock("75:00").is_err());
        assert!(parse_clock("1:60").is_err());
        assert!(parse_clock("123:45").is_err());
        assert!(parse_clock("1:2:3:4").is_err());
        assert!(parse_clock("12").is_err());
        assert!(parse_clock(":30").is_err());
        assert!(parse_clock("").is_err());
    }

    #[test]
    fn test_parse_time_arg() {
        assert_eq!(parse_time_arg("90").unwrap(), 90);
        assert_eq!(parse_time_arg("1:30").unwrap(), 90);
        assert!(parse_time_arg("abc").is_err());
    }
}
