//! Network log loading.
//!
//! Accepts either a JSON array of events or the simulator's raw event log,
//! where every transfer is printed as one JSON object per line behind a
//! logger timestamp and followed by a comma:
//!
//! ```text
//! 2019/05/01 12:00:00.123456 {"From":"root","To":"org-0","Object":"nonce",...},
//! ```

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use color_eyre::eyre::{Context, Result};
use rayon::prelude::*;
use regex::Regex;

use super::types::*;

/// Compiled regex patterns for raw event log lines
pub struct LogPatterns {
    /// Match: "[YYYY/MM/DD HH:MM:SS[.ffffff] ]{...}[,]"
    pub event_line: Regex,
}

impl LogPatterns {
    pub fn new() -> Self {
        Self {
            event_line: Regex::new(
                r"^\s*(?:\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}(?:\.\d+)?\s+)?(\{.*\})\s*,?\s*$"
            ).expect("Invalid event_line regex"),
        }
    }
}

impl Default for LogPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<LogPatterns> = LazyLock::new(LogPatterns::new);

/// Shape of a network log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    JsonArray,
    EventLines,
}

pub fn detect_format(content: &str) -> LogFormat {
    if content.trim_start().starts_with('[') {
        LogFormat::JsonArray
    } else {
        LogFormat::EventLines
    }
}

/// Events recovered from a raw event log.
#[derive(Debug, Default)]
pub struct ParsedLines {
    pub events: Vec<NetworkEvent>,
    /// Lines that held a JSON object which did not decode as an event.
    pub skipped: usize,
}

/// Decode one raw log line. `None` when the line carries no event object.
pub fn parse_event_line(line: &str) -> Option<std::result::Result<NetworkEvent, serde_json::Error>> {
    let caps = PATTERNS.event_line.captures(line)?;
    let json = caps.get(1)?.as_str();
    Some(serde_json::from_str(json))
}

/// Parse every line of a raw event log in parallel, keeping log order.
pub fn parse_event_lines(content: &str) -> ParsedLines {
    let lines: Vec<(usize, &str)> = content.lines().enumerate().collect();

    let outcomes: Vec<(usize, std::result::Result<NetworkEvent, serde_json::Error>)> = lines
        .par_iter()
        .filter_map(|(index, line)| parse_event_line(line).map(|outcome| (index + 1, outcome)))
        .collect();

    let mut parsed = ParsedLines::default();
    for (line_no, outcome) in outcomes {
        match outcome {
            Ok(event) => parsed.events.push(event),
            Err(e) => {
                log::debug!("Skipping line {}: {}", line_no, e);
                parsed.skipped += 1;
            }
        }
    }

    if parsed.skipped > 0 {
        log::warn!("Skipped {} malformed event lines", parsed.skipped);
    }

    parsed
}

/// Parse network log content in either supported format.
///
/// A JSON array that does not parse (typically raw log lines wrapped in
/// brackets with their trailing commas left in) is re-read line by line.
pub fn parse_network_log(content: &str) -> Result<Vec<NetworkEvent>> {
    if detect_format(content) == LogFormat::JsonArray {
        match serde_json::from_str::<Vec<NetworkEvent>>(content) {
            Ok(events) => return Ok(events),
            Err(e) => {
                let parsed = parse_event_lines(content);
                if parsed.events.is_empty() {
                    return Err(e).context("Failed to parse network log as a JSON array");
                }
                log::warn!(
                    "Network log is not a valid JSON array ({}); recovered {} events line by line",
                    e,
                    parsed.events.len()
                );
                return Ok(parsed.events);
            }
        }
    }

    Ok(parse_event_lines(content).events)
}

/// Read and parse a network log file.
pub fn load_network_log(path: &Path) -> Result<Vec<NetworkEvent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read network log from {}", path.display()))?;

    let events = parse_network_log(&content)
        .with_context(|| format!("Failed to parse network log {}", path.display()))?;

    log::debug!("Loaded {} events from {}", events.len(), path.display());
    Ok(events)
}
