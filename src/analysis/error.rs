//! Errors raised by the usage computation.

/// Failures of a single chart computation. Any of these aborts the whole
/// computation; no partial chart is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Network log is empty: no time span to bucket")]
    EmptyLog,
    #[error("Invalid nominal bandwidth: {bandwidth} bytes/s{}", describe_event(.event_id))]
    InvalidBandwidth {
        bandwidth: i64,
        /// Set when the rate came from a specific event.
        event_id: Option<u64>,
    },
    #[error("Invalid bucket width: {0}")]
    InvalidBucketWidth(String),
}

fn describe_event(event_id: &Option<u64>) -> String {
    match event_id {
        Some(id) => format!(" (event {})", id),
        None => String::new(),
    }
}
