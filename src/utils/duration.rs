//! Duration parsing utilities.
//!
//! Window widths are given on the command line and in configuration files
//! as human-readable durations ("50ms", "1s", "250us").

use std::time::Duration;

use chrono::TimeDelta;
use humantime_serde::re::humantime;

/// Parse a duration string into a [`Duration`]
///
/// Supports:
/// - Raw milliseconds: "50"
/// - Any humantime duration: "50ms", "1s", "1s 500ms", "250us"
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use network_analyzer::utils::duration::parse_duration;
///
/// assert_eq!(parse_duration("50"), Ok(Duration::from_millis(50)));
/// assert_eq!(parse_duration("1s 500ms"), Ok(Duration::from_millis(1500)));
/// assert!(parse_duration("fast").is_err());
/// ```
pub fn parse_duration(duration: &str) -> Result<Duration, String> {
    let duration = duration.trim();

    // Bare numbers are milliseconds, the resolution of the event log
    if let Ok(ms) = duration.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }

    humantime::parse_duration(duration).map_err(|e| format!("Invalid duration '{}': {}", duration, e))
}

/// Convert a std duration into a chrono delta
pub fn to_time_delta(duration: Duration) -> Result<TimeDelta, String> {
    TimeDelta::from_std(duration).map_err(|_| format!("Duration out of range: {:?}", duration))
}
