//! Network usage analysis for simulator transfer logs.
//!
//! This module turns a log of transfer events into a time-bucketed chart of
//! per-category concurrency and ideal vs. observed latency, and handles
//! loading the log and writing the resulting reports.

pub mod types;
pub mod error;
pub mod endpoints;
pub mod sweep;
pub mod latency;
pub mod chart;
pub mod log_parser;
pub mod cache;
pub mod report;

pub use types::*;
pub use error::AnalysisError;
pub use chart::{build_usage_chart, AnalysisOptions, BandwidthPolicy};
pub use sweep::BucketWidth;
pub use log_parser::{load_network_log, parse_network_log};
pub use report::{generate_json_report, generate_text_report, summarize};
