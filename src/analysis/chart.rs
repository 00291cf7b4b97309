//! Usage chart assembly: events in, index-aligned series out.

use std::collections::{BTreeMap, BTreeSet};

use super::endpoints::expand_and_sort;
use super::error::AnalysisError;
use super::latency::{LatencyEstimator, NominalBandwidth};
use super::sweep::{sweep, Bucket, BucketWidth};
use super::types::*;

/// Where the nominal bandwidth for ideal latency comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandwidthPolicy {
    /// `local_bandwidth` of the first event in the log, used for every
    /// transfer. Matches charts produced by earlier tooling.
    #[default]
    FirstEvent,
    /// Caller-supplied rate, bytes per second.
    Fixed(i64),
    /// Each transfer against its own event's `local_bandwidth`.
    PerEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisOptions {
    pub bucket_width: BucketWidth,
    pub bandwidth: BandwidthPolicy,
}

/// Turn a policy into the explicit rate handed to the latency estimator.
pub fn resolve_bandwidth(
    policy: BandwidthPolicy,
    events: &[NetworkEvent],
) -> Result<NominalBandwidth, AnalysisError> {
    match policy {
        BandwidthPolicy::FirstEvent => {
            let first = events.first().ok_or(AnalysisError::EmptyLog)?;
            let distinct: BTreeSet<i64> = events.iter().map(|e| e.local_bandwidth).collect();
            if distinct.len() > 1 {
                log::warn!(
                    "Events carry {} distinct local bandwidths; using {} B/s from event {} for every transfer",
                    distinct.len(),
                    first.local_bandwidth,
                    first.id
                );
            }
            Ok(NominalBandwidth::RunWide(first.local_bandwidth))
        }
        BandwidthPolicy::Fixed(rate) => Ok(NominalBandwidth::RunWide(rate)),
        BandwidthPolicy::PerEvent => Ok(NominalBandwidth::PerEvent),
    }
}

/// Compute the usage chart for a full event log.
///
/// Fails with [`AnalysisError::EmptyLog`] on an empty log and with
/// [`AnalysisError::InvalidBandwidth`] when a non-positive rate would be used
/// for ideal latency. Malformed events are not rejected.
pub fn build_usage_chart(
    events: &[NetworkEvent],
    options: &AnalysisOptions,
) -> Result<ChartData, AnalysisError> {
    if events.is_empty() {
        return Err(AnalysisError::EmptyLog);
    }

    let bandwidth = resolve_bandwidth(options.bandwidth, events)?;
    let estimator = LatencyEstimator::new(bandwidth, events)?;
    let endpoints = expand_and_sort(events);
    let buckets = sweep(&endpoints, options.bucket_width, &estimator)?;

    let categories: BTreeSet<String> = events.iter().map(|e| e.object.clone()).collect();
    Ok(assemble(categories, buckets))
}

/// Collect buckets into parallel series, one entry per bucket for every
/// category.
pub fn assemble<'a>(
    categories: BTreeSet<String>,
    buckets: impl IntoIterator<Item = Bucket<'a>>,
) -> ChartData {
    let buckets = buckets.into_iter();
    let capacity = buckets.size_hint().0;

    let mut chart = ChartData {
        intervals: Vec::with_capacity(capacity),
        counts: categories
            .iter()
            .map(|c| (c.clone(), Vec::with_capacity(capacity)))
            .collect::<BTreeMap<_, _>>(),
        categories,
        latency_ideal: Vec::with_capacity(capacity),
        latency_real: Vec::with_capacity(capacity),
        endpoint_counts: Vec::with_capacity(capacity),
    };

    for bucket in buckets {
        for (category, series) in chart.counts.iter_mut() {
            series.push(bucket.counts.get(category));
        }
        chart.intervals.push(bucket.timestamp);
        chart.latency_ideal.push(bucket.latency_ideal);
        chart.latency_real.push(bucket.latency_real);
        chart.endpoint_counts.push(bucket.endpoints);
    }

    chart
}
