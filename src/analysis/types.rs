//! Core data types for network usage analysis.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Simulation timestamp. Simulator logs carry local offsets; everything is
/// normalized to UTC on load.
pub type SimTime = DateTime<Utc>;

/// A single network transfer as recorded by the simulator.
///
/// Field names follow the simulator's log format (`From`, `LocalBandwidth`,
/// `ID`, ...); camelCase spellings are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkEvent {
    #[serde(alias = "from")]
    pub from: String,
    #[serde(alias = "to")]
    pub to: String,
    /// Category of the transferred artifact; the grouping key of every series.
    #[serde(alias = "object")]
    pub object: String,
    /// Payload size in bytes.
    #[serde(alias = "size")]
    pub size: i64,
    #[serde(alias = "start")]
    pub start: SimTime,
    #[serde(alias = "end")]
    pub end: SimTime,
    /// Nominal per-connection bandwidth, bytes per second.
    #[serde(default, alias = "localBandwidth")]
    pub local_bandwidth: i64,
    /// Nominal network-wide bandwidth, bytes per second.
    #[serde(default, alias = "globalBandwidth")]
    pub global_bandwidth: i64,
    #[serde(default, rename = "ID", alias = "Id", alias = "id")]
    pub id: u64,
}

impl NetworkEvent {
    /// Observed transfer duration. Negative when the record is malformed.
    pub fn elapsed(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// One boundary (start or end) of an event's interval.
///
/// Borrows the category from its source event, so endpoints live no longer
/// than the event slice they were expanded from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalEndpoint<'a> {
    pub object: &'a str,
    pub when: SimTime,
    pub is_start: bool,
    /// `end - start` of the source event.
    pub elapsed: TimeDelta,
    pub size: i64,
    pub local_bandwidth: i64,
    pub event_id: u64,
}

impl IntervalEndpoint<'_> {
    /// Contribution of this endpoint to its category's running count.
    pub fn delta(&self) -> i64 {
        if self.is_start {
            1
        } else {
            -1
        }
    }
}

/// Time-bucketed usage chart written to `usage.json`.
///
/// All sequences are index-aligned with `intervals`. Key names match what
/// the plotting scripts read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChartData {
    /// Start instant of every window, non-decreasing.
    pub intervals: Vec<SimTime>,
    #[serde(rename = "BarCategories")]
    pub categories: BTreeSet<String>,
    /// Running concurrency count per category, one entry per window.
    #[serde(rename = "BarData")]
    pub counts: BTreeMap<String, Vec<i64>>,
    /// Mean ideal transfer duration per window, milliseconds.
    pub latency_ideal: Vec<f64>,
    /// Mean observed transfer duration per window, milliseconds.
    pub latency_real: Vec<f64>,
    /// Endpoints inside each window. Not part of `usage.json`, so empty for
    /// a chart read back from disk.
    #[serde(skip)]
    pub endpoint_counts: Vec<usize>,
}

impl ChartData {
    /// Number of windows.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// True when every series has exactly one entry per window.
    pub fn is_aligned(&self) -> bool {
        let n = self.intervals.len();
        self.latency_ideal.len() == n
            && self.latency_real.len() == n
            && (self.endpoint_counts.is_empty() || self.endpoint_counts.len() == n)
            && self.categories.len() == self.counts.len()
            && self.counts.values().all(|series| series.len() == n)
    }

    /// Indices of windows that had at least one endpoint.
    pub fn active_windows(&self) -> impl Iterator<Item = usize> + '_ {
        self.endpoint_counts
            .iter()
            .enumerate()
            .filter(|(_, &n)| n > 0)
            .map(|(i, _)| i)
    }

    /// Running count series for one category.
    pub fn series(&self, category: &str) -> Option<&[i64]> {
        self.counts.get(category).map(Vec::as_slice)
    }
}
