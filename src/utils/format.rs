//! Human-readable formatting for reports.

/// Format bytes as human-readable string
pub fn format_bytes(bytes: i64) -> String {
    let magnitude = bytes.unsigned_abs();
    if magnitude >= 1_000_000_000 {
        format!("{:.2} GB", bytes as f64 / 1_000_000_000.0)
    } else if magnitude >= 1_000_000 {
        format!("{:.2} MB", bytes as f64 / 1_000_000.0)
    } else if magnitude >= 1_000 {
        format!("{:.2} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Format milliseconds, switching to seconds above one second
pub fn format_ms(ms: f64) -> String {
    if ms.abs() >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else {
        format!("{:.1} ms", ms)
    }
}
