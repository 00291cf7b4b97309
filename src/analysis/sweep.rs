//! Fixed-width window sweep over sorted interval endpoints.
//!
//! Windows start at the earliest endpoint and advance by the bucket width
//! while the cursor is before the latest endpoint. A window covers
//! `[cursor, cursor + width]` with BOTH ends inclusive, so an endpoint that
//! lands exactly on a boundary is counted in the two windows sharing it.
//! Existing `usage.json` outputs depend on this. With `Divisions(n)` the
//! span is split into exactly `n` windows instead.
//!
//! Only endpoints are tested against a window. A transfer that starts before
//! a window and ends after it contributes nothing to that window's latency.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::error::AnalysisError;
use super::latency::LatencyEstimator;
use super::types::*;

/// Default window width of the latency-aware chart.
pub const DEFAULT_BUCKET_WIDTH: Duration = Duration::from_millis(50);

/// Window count of the count-only chart, which split the span evenly.
pub const DEFAULT_DIVISIONS: u32 = 1000;

/// How wide each window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketWidth {
    /// Constant width independent of the log's span.
    Fixed(TimeDelta),
    /// `n` windows across the whole span, `(max - min) / n` wide each.
    Divisions(u32),
}

impl Default for BucketWidth {
    fn default() -> Self {
        BucketWidth::Fixed(TimeDelta::milliseconds(DEFAULT_BUCKET_WIDTH.as_millis() as i64))
    }
}

impl fmt::Display for BucketWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketWidth::Fixed(width) => match width.to_std() {
                Ok(std) => write!(f, "{}", humantime_serde::re::humantime::format_duration(std)),
                Err(_) => write!(f, "{}", width),
            },
            BucketWidth::Divisions(n) => write!(f, "{} divisions", n),
        }
    }
}

impl BucketWidth {
    /// Nominal window width for a log spanning `span`.
    ///
    /// Derived widths are truncated to whole nanoseconds and clamped to one
    /// nanosecond so a very short span can never stall the sweep. The sweep
    /// itself places division boundaries exactly, see [`Windows::for_width`].
    pub fn resolve(&self, span: TimeDelta) -> Result<TimeDelta, AnalysisError> {
        match *self {
            BucketWidth::Fixed(width) if width <= TimeDelta::zero() => Err(
                AnalysisError::InvalidBucketWidth(format!("width must be positive, got {}", width)),
            ),
            BucketWidth::Fixed(width) => Ok(width),
            BucketWidth::Divisions(0) => Err(AnalysisError::InvalidBucketWidth(
                "division count must be positive".to_string(),
            )),
            BucketWidth::Divisions(n) => {
                let n = i32::try_from(n).map_err(|_| {
                    AnalysisError::InvalidBucketWidth(format!("too many divisions: {}", n))
                })?;
                Ok((span / n).max(TimeDelta::nanoseconds(1)))
            }
        }
    }
}

/// Number of windows a sweep of `span` at `width` produces.
pub fn window_count(span: TimeDelta, width: TimeDelta) -> u64 {
    if span <= TimeDelta::zero() || width <= TimeDelta::zero() {
        return 0;
    }
    let span_ns = nanos(span);
    let width_ns = nanos(width);
    ((span_ns + width_ns - 1) / width_ns) as u64
}

fn nanos(delta: TimeDelta) -> i128 {
    delta.num_seconds() as i128 * 1_000_000_000 + delta.subsec_nanos() as i128
}

/// Per-category concurrency count carried from window to window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunningCounts<'a>(BTreeMap<&'a str, i64>);

impl<'a> RunningCounts<'a> {
    /// All categories at zero.
    pub fn zeroed(categories: impl IntoIterator<Item = &'a str>) -> Self {
        Self(categories.into_iter().map(|c| (c, 0)).collect())
    }

    /// Counts after applying one window's endpoints: +1 per start, -1 per end.
    pub fn advance(&self, window: &[IntervalEndpoint<'a>]) -> Self {
        let mut next = self.clone();
        for endpoint in window {
            *next.0.entry(endpoint.object).or_insert(0) += endpoint.delta();
        }
        next
    }

    pub fn get(&self, category: &str) -> i64 {
        self.0.get(category).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, i64)> + '_ {
        self.0.iter().map(|(c, n)| (*c, *n))
    }
}

/// One window and the endpoints inside it.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub start: SimTime,
    /// Inclusive.
    pub end: SimTime,
    pub endpoints: &'a [IntervalEndpoint<'a>],
}

/// Endpoints with `start <= when <= end`. `sorted` must be ordered by `when`.
pub fn select_window<'a>(
    sorted: &'a [IntervalEndpoint<'a>],
    start: SimTime,
    end: SimTime,
) -> &'a [IntervalEndpoint<'a>] {
    let lo = sorted.partition_point(|e| e.when < start);
    let hi = sorted.partition_point(|e| e.when <= end).max(lo);
    &sorted[lo..hi]
}

/// How a sweep steps from one window to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stepping {
    /// Constant width while the cursor is before the last endpoint.
    Fixed(TimeDelta),
    /// Exactly `n` windows, window `k` starting at `first + k * span / n`.
    Divided { n: u32, span_ns: i64 },
}

/// Iterator over the windows of a sweep.
pub struct Windows<'a> {
    sorted: &'a [IntervalEndpoint<'a>],
    first: SimTime,
    cursor: SimTime,
    last: SimTime,
    stepping: Stepping,
    index: u32,
}

impl<'a> Windows<'a> {
    /// Windows for a configured bucket width.
    ///
    /// `Divisions(n)` yields exactly `n` windows whose boundaries are placed
    /// on the nanosecond at or before `k * span / n`, so neighbouring widths
    /// differ by at most one nanosecond and the last window ends on the last
    /// endpoint. A span shorter than `n` nanoseconds falls back to the
    /// clamped one-nanosecond width and yields fewer windows.
    pub fn for_width(sorted: &'a [IntervalEndpoint<'a>], width: BucketWidth) -> Result<Self, AnalysisError> {
        let span = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => last.when - first.when,
            _ => TimeDelta::zero(),
        };
        let resolved = width.resolve(span)?;

        let stepping = match (width, span.num_nanoseconds()) {
            (BucketWidth::Divisions(n), Some(span_ns)) if span_ns >= i64::from(n) => {
                Stepping::Divided { n, span_ns }
            }
            _ => Stepping::Fixed(resolved),
        };
        Ok(Self::with_stepping(sorted, stepping))
    }

    fn with_stepping(sorted: &'a [IntervalEndpoint<'a>], stepping: Stepping) -> Self {
        let (first, last) = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => (first.when, last.when),
            _ => (DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MIN_UTC),
        };
        Self { sorted, first, cursor: first, last, stepping, index: 0 }
    }

    /// Number of windows the full iteration yields.
    pub fn expected_len(&self) -> u64 {
        match self.stepping {
            Stepping::Fixed(width) => window_count(self.last - self.first, width),
            Stepping::Divided { n, .. } => u64::from(n),
        }
    }

    fn boundary(&self, k: u32, n: u32, span_ns: i64) -> SimTime {
        // k <= n, so the offset never exceeds span_ns
        let offset = (i128::from(k) * i128::from(span_ns) / i128::from(n)) as i64;
        self.first + TimeDelta::nanoseconds(offset)
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Window<'a>> {
        let (start, end) = match self.stepping {
            Stepping::Fixed(width) => {
                if self.cursor >= self.last {
                    return None;
                }
                let start = self.cursor;
                let end = start
                    .checked_add_signed(width)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                self.cursor = end;
                (start, end)
            }
            Stepping::Divided { n, span_ns } => {
                if self.index >= n {
                    return None;
                }
                let start = self.boundary(self.index, n, span_ns);
                let end = self.boundary(self.index + 1, n, span_ns);
                self.index += 1;
                (start, end)
            }
        };

        Some(Window {
            start,
            end,
            endpoints: select_window(self.sorted, start, end),
        })
    }
}

/// Aggregates of one window.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<'a> {
    pub timestamp: SimTime,
    /// Endpoints that fell inside the window.
    pub endpoints: usize,
    pub counts: RunningCounts<'a>,
    pub latency_ideal: f64,
    pub latency_real: f64,
}

/// Sweep sorted endpoints into buckets.
///
/// The running count is threaded through the windows as an accumulator,
/// starting from zero for every category present in `sorted`.
pub fn sweep<'a>(
    sorted: &'a [IntervalEndpoint<'a>],
    width: BucketWidth,
    estimator: &LatencyEstimator,
) -> Result<Vec<Bucket<'a>>, AnalysisError> {
    let span = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => last.when - first.when,
        _ => return Err(AnalysisError::EmptyLog),
    };
    let windows = Windows::for_width(sorted, width)?;

    log::info!(
        "Intervals number: {} ({}, {} per window, bandwidth {})",
        windows.expected_len(),
        width,
        BucketWidth::Fixed(width.resolve(span)?),
        estimator.bandwidth()
    );

    let initial = RunningCounts::zeroed(sorted.iter().map(|e| e.object));
    let buckets: Vec<Bucket<'a>> = windows
        .scan(initial, |counts, window| {
            *counts = counts.advance(window.endpoints);
            let latency = estimator.estimate(window.endpoints);
            Some(Bucket {
                timestamp: window.start,
                endpoints: window.endpoints.len(),
                counts: counts.clone(),
                latency_ideal: latency.ideal_ms,
                latency_real: latency.real_ms,
            })
        })
        .collect();

    log::debug!("Swept {} endpoints into {} buckets", sorted.len(), buckets.len());
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::latency::NominalBandwidth;
    use chrono::TimeZone;

    fn t0() -> SimTime {
        Utc.with_ymd_and_hms(2019, 5, 1, 12, 0, 0).unwrap()
    }

    fn at(ms: i64, object: &'static str, is_start: bool) -> IntervalEndpoint<'static> {
        IntervalEndpoint {
            object,
            when: t0() + TimeDelta::milliseconds(ms),
            is_start,
            elapsed: TimeDelta::milliseconds(10),
            size: 100,
            local_bandwidth: 10_000,
            event_id: 0,
        }
    }

    fn estimator() -> LatencyEstimator {
        LatencyEstimator::new(NominalBandwidth::RunWide(10_000), &[]).unwrap()
    }

    #[test]
    fn test_resolve_fixed_width() {
        let width = BucketWidth::default();
        assert_eq!(width.resolve(TimeDelta::seconds(10)).unwrap(), TimeDelta::milliseconds(50));
        assert!(BucketWidth::Fixed(TimeDelta::zero()).resolve(TimeDelta::seconds(1)).is_err());
        assert!(BucketWidth::Fixed(TimeDelta::milliseconds(-5)).resolve(TimeDelta::seconds(1)).is_err());
    }

    #[test]
    fn test_resolve_divisions() {
        let width = BucketWidth::Divisions(DEFAULT_DIVISIONS);
        assert_eq!(width.resolve(TimeDelta::seconds(10)).unwrap(), TimeDelta::milliseconds(10));
        assert_eq!(width.resolve(TimeDelta::nanoseconds(10)).unwrap(), TimeDelta::nanoseconds(1));
        assert!(matches!(
            BucketWidth::Divisions(0).resolve(TimeDelta::seconds(1)),
            Err(AnalysisError::InvalidBucketWidth(_))
        ));
    }

    #[test]
    fn test_bucket_width_display() {
        assert_eq!(BucketWidth::default().to_string(), "50ms");
        assert_eq!(BucketWidth::Divisions(1000).to_string(), "1000 divisions");
    }

    #[test]
    fn test_window_count() {
        assert_eq!(window_count(TimeDelta::milliseconds(100), TimeDelta::milliseconds(50)), 2);
        assert_eq!(window_count(TimeDelta::milliseconds(101), TimeDelta::milliseconds(50)), 3);
        assert_eq!(window_count(TimeDelta::zero(), TimeDelta::milliseconds(50)), 0);
    }

    #[test]
    fn test_select_window_is_inclusive_on_both_ends() {
        let sorted = vec![at(0, "a", true), at(50, "a", false), at(51, "a", true), at(100, "a", false)];

        let first = select_window(&sorted, t0(), t0() + TimeDelta::milliseconds(50));
        assert_eq!(first.len(), 2);
        let second = select_window(
            &sorted,
            t0() + TimeDelta::milliseconds(50),
            t0() + TimeDelta::milliseconds(100),
        );
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_running_counts_advance_is_pure() {
        let window = vec![at(0, "a", true), at(1, "a", true), at(2, "b", false)];
        let prior = RunningCounts::zeroed(["a", "b", "c"]);

        let next = prior.advance(&window);
        assert_eq!(next.get("a"), 2);
        assert_eq!(next.get("b"), -1);
        assert_eq!(next.get("c"), 0);
        assert_eq!(prior.get("a"), 0);

        let after = next.advance(&[at(5, "a", false)]);
        assert_eq!(after.get("a"), 1);
        assert_eq!(after.iter().count(), 3);
    }

    #[test]
    fn test_divided_windows_cover_uneven_span() {
        // 1_000_000_001 ns does not split evenly into 1000 windows
        let mut end = at(0, "a", false);
        end.when = t0() + TimeDelta::nanoseconds(1_000_000_001);
        let sorted = vec![at(0, "a", true), end];

        let windows = Windows::for_width(&sorted, BucketWidth::Divisions(1000)).unwrap();
        assert_eq!(windows.expected_len(), 1000);
        let spans: Vec<Window<'_>> = windows.collect();
        assert_eq!(spans.len(), 1000);
        assert_eq!(spans[0].start, t0());
        assert_eq!(spans[999].end, sorted[1].when);
        assert!(spans.windows(2).all(|w| w[0].end == w[1].start));
        assert!(spans
            .iter()
            .all(|w| (w.end - w.start) >= TimeDelta::nanoseconds(1_000_000)
                && (w.end - w.start) <= TimeDelta::nanoseconds(1_000_001)));
    }

    #[test]
    fn test_divided_windows_short_span_falls_back_to_clamp() {
        let mut end = at(0, "a", false);
        end.when = t0() + TimeDelta::nanoseconds(10);
        let sorted = vec![at(0, "a", true), end];

        let windows = Windows::for_width(&sorted, BucketWidth::Divisions(1000)).unwrap();
        assert_eq!(windows.expected_len(), 10);
        assert_eq!(windows.count(), 10);
    }

    #[test]
    fn test_sweep_records_endpoints_per_window() {
        let sorted = vec![at(0, "a", true), at(10, "a", false), at(120, "b", true), at(130, "b", false)];
        let buckets = sweep(&sorted, BucketWidth::default(), &estimator()).unwrap();

        let endpoints: Vec<usize> = buckets.iter().map(|b| b.endpoints).collect();
        assert_eq!(endpoints, vec![2, 0, 2]);
    }

    #[test]
    fn test_sweep_empty_is_error() {
        assert_eq!(sweep(&[], BucketWidth::default(), &estimator()).unwrap_err(), AnalysisError::EmptyLog);
    }

    #[test]
    fn test_sweep_single_instant_produces_no_windows() {
        let sorted = vec![at(0, "a", true), at(0, "a", false)];
        let buckets = sweep(&sorted, BucketWidth::default(), &estimator()).unwrap();
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_sweep_windows_and_gaps() {
        // a: [0, 120], b: [130, 260]
        let sorted = vec![at(0, "a", true), at(120, "a", false), at(130, "b", true), at(260, "b", false)];
        let buckets = sweep(&sorted, BucketWidth::default(), &estimator()).unwrap();

        let starts: Vec<i64> = buckets
            .iter()
            .map(|b| (b.timestamp - t0()).num_milliseconds())
            .collect();
        assert_eq!(starts, vec![0, 50, 100, 150, 200, 250]);

        let a: Vec<i64> = buckets.iter().map(|b| b.counts.get("a")).collect();
        let b: Vec<i64> = buckets.iter().map(|b| b.counts.get("b")).collect();
        assert_eq!(a, vec![1, 1, 0, 0, 0, 0]);
        assert_eq!(b, vec![0, 0, 1, 1, 1, 0]);

        // Window [50, 100] holds no endpoint
        assert_eq!(buckets[1].latency_ideal, 0.0);
        assert_eq!(buckets[1].latency_real, 0.0);
        assert!((buckets[0].latency_ideal - 10.0).abs() < 1e-9);
    }
}
