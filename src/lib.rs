//! # network-analyzer - Concurrency and latency analysis of simulator network logs
//!
//! The network simulator records every transfer between participants (nonces,
//! credential requests, transaction proposals, endorsements, ...) as an event
//! with a start and end time. This library turns such a log into a
//! time-bucketed chart of how many transfers of each kind are in flight, and
//! how their observed latency compares to the latency the nominal bandwidth
//! would allow.
//!
//! ## Architecture
//!
//! - `analysis::endpoints`: expands events into sorted start/end endpoints
//! - `analysis::sweep`: fixed-width window sweep with running per-category counts
//! - `analysis::latency`: ideal vs. real latency averages per window
//! - `analysis::chart`: assembles the index-aligned `ChartData` series
//! - `analysis::log_parser` / `analysis::cache`: network log loading
//! - `analysis::report`: `usage.json` and text summaries
//! - `config` / `config_loader`: YAML configuration and CLI overrides
//! - `utils`: duration parsing and formatting helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use network_analyzer::analysis::{self, AnalysisOptions};
//!
//! let events = analysis::load_network_log(Path::new("network.log"))?;
//! let chart = analysis::build_usage_chart(&events, &AnalysisOptions::default())?;
//! analysis::generate_json_report(&chart, Path::new("out/usage.json"), false)?;
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```
//!
//! ## Windowing
//!
//! Windows are `[cursor, cursor + width]` with both ends inclusive, starting
//! at the earliest endpoint. An endpoint on a boundary is counted in both
//! adjacent windows, and a transfer whose endpoints both lie outside a window
//! does not contribute to that window's latency. Charts produced by earlier
//! tooling rely on both behaviors.
//!
//! ## Error Handling
//!
//! The computation itself returns `analysis::AnalysisError`. Loading, writing
//! and configuration return `color_eyre::eyre::Result` with file context.

pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod utils;
