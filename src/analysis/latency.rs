//! Ideal vs. observed transfer latency for the endpoints of a window.
//!
//! The ideal duration of a transfer is the time its payload needs at the
//! nominal bandwidth: `1000 * size / bandwidth` milliseconds. The real
//! duration is the elapsed time recorded for the event. Both are averaged
//! over the endpoints that fall inside a window, in floating point.

use std::fmt;

use chrono::TimeDelta;

use super::error::AnalysisError;
use super::types::*;

/// Which bandwidth the ideal duration is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalBandwidth {
    /// One rate for the whole run, bytes per second.
    RunWide(i64),
    /// Each endpoint uses its own event's `local_bandwidth`.
    PerEvent,
}

impl fmt::Display for NominalBandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NominalBandwidth::RunWide(rate) => write!(f, "{} B/s", rate),
            NominalBandwidth::PerEvent => write!(f, "per event"),
        }
    }
}

/// Latency series selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyKind {
    Ideal,
    Real,
}

/// Mean latencies of one window, milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowLatency {
    pub ideal_ms: f64,
    pub real_ms: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LatencyEstimator {
    bandwidth: NominalBandwidth,
}

impl LatencyEstimator {
    /// Build an estimator, rejecting non-positive rates up front so no window
    /// can produce an infinite or NaN average.
    pub fn new(bandwidth: NominalBandwidth, events: &[NetworkEvent]) -> Result<Self, AnalysisError> {
        match bandwidth {
            NominalBandwidth::RunWide(rate) if rate <= 0 => {
                return Err(AnalysisError::InvalidBandwidth { bandwidth: rate, event_id: None });
            }
            NominalBandwidth::RunWide(_) => {}
            NominalBandwidth::PerEvent => {
                if let Some(bad) = events.iter().find(|e| e.local_bandwidth <= 0) {
                    return Err(AnalysisError::InvalidBandwidth {
                        bandwidth: bad.local_bandwidth,
                        event_id: Some(bad.id),
                    });
                }
            }
        }

        Ok(Self { bandwidth })
    }

    pub fn bandwidth(&self) -> NominalBandwidth {
        self.bandwidth
    }

    /// Duration of a single endpoint's transfer, milliseconds.
    pub fn duration_ms(&self, kind: LatencyKind, endpoint: &IntervalEndpoint<'_>) -> f64 {
        match kind {
            LatencyKind::Ideal => {
                let rate = match self.bandwidth {
                    NominalBandwidth::RunWide(rate) => rate,
                    NominalBandwidth::PerEvent => endpoint.local_bandwidth,
                };
                1000.0 * endpoint.size as f64 / rate as f64
            }
            LatencyKind::Real => millis(endpoint.elapsed),
        }
    }

    /// Arithmetic mean over the given endpoints; zero when there are none.
    pub fn mean_ms(&self, kind: LatencyKind, endpoints: &[IntervalEndpoint<'_>]) -> f64 {
        if endpoints.is_empty() {
            return 0.0;
        }
        let total: f64 = endpoints.iter().map(|e| self.duration_ms(kind, e)).sum();
        total / endpoints.len() as f64
    }

    pub fn estimate(&self, endpoints: &[IntervalEndpoint<'_>]) -> WindowLatency {
        WindowLatency {
            ideal_ms: self.mean_ms(LatencyKind::Ideal, endpoints),
            real_ms: self.mean_ms(LatencyKind::Real, endpoints),
        }
    }
}

/// Fractional milliseconds of a time delta.
pub fn millis(delta: TimeDelta) -> f64 {
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1_000_000.0,
        // Beyond ~292 years of nanoseconds
        None => delta.num_milliseconds() as f64,
    }
}
