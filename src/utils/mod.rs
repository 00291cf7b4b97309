//! Shared utilities: duration parsing and human-readable formatting.

pub mod duration;
pub mod format;

pub use duration::{parse_duration, to_time_delta};
pub use format::{format_bytes, format_ms};
