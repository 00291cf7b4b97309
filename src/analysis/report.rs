//! Report generation for network usage analysis.
//!
//! Writes the chart consumed by the plotting scripts (`usage.json`) and a
//! human-readable summary of it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use super::chart::AnalysisOptions;
use super::latency::millis;
use super::types::*;
use crate::utils::format::{format_bytes, format_ms};

/// Per-category totals over the whole log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub transfers: u64,
    pub total_bytes: i64,
    /// Highest running count over all windows.
    pub peak_concurrency: i64,
}

/// Overview of one usage chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub analysis_timestamp: String,
    pub total_events: usize,
    pub window_count: usize,
    pub bucket_width: String,
    pub span_ms: f64,
    pub categories: Vec<CategorySummary>,
    /// Windows in which at least one endpoint fell.
    pub active_windows: usize,
    pub mean_latency_ideal_ms: f64,
    pub mean_latency_real_ms: f64,
    /// Real over ideal latency; `None` when ideal latency is zero.
    pub slowdown: Option<f64>,
}

/// Summarize a computed chart together with the events it came from.
pub fn summarize(events: &[NetworkEvent], chart: &ChartData, options: &AnalysisOptions) -> UsageSummary {
    let mut by_category: BTreeMap<&str, (u64, i64)> = BTreeMap::new();
    for event in events {
        let entry = by_category.entry(event.object.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += event.size;
    }

    let categories = by_category
        .into_iter()
        .map(|(category, (transfers, total_bytes))| CategorySummary {
            category: category.to_string(),
            transfers,
            total_bytes,
            peak_concurrency: chart
                .series(category)
                .and_then(|series| series.iter().copied().max())
                .unwrap_or(0),
        })
        .collect();

    let span_ms = match (
        events.iter().flat_map(|e| [e.start, e.end]).min(),
        events.iter().flat_map(|e| [e.start, e.end]).max(),
    ) {
        (Some(first), Some(last)) => millis(last - first),
        _ => 0.0,
    };

    let active: Vec<usize> = chart.active_windows().collect();
    let mean_over_active = |series: &[f64]| {
        if active.is_empty() {
            0.0
        } else {
            active.iter().map(|&i| series[i]).sum::<f64>() / active.len() as f64
        }
    };
    let mean_latency_ideal_ms = mean_over_active(&chart.latency_ideal);
    let mean_latency_real_ms = mean_over_active(&chart.latency_real);

    UsageSummary {
        analysis_timestamp: chrono::Utc::now().to_rfc3339(),
        total_events: events.len(),
        window_count: chart.len(),
        bucket_width: options.bucket_width.to_string(),
        span_ms,
        categories,
        active_windows: active.len(),
        mean_latency_ideal_ms,
        mean_latency_real_ms,
        slowdown: (mean_latency_ideal_ms > 0.0).then(|| mean_latency_real_ms / mean_latency_ideal_ms),
    }
}

/// Generate the JSON chart (`usage.json`)
pub fn generate_json_report(chart: &ChartData, output_path: &Path, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(chart)
    } else {
        serde_json::to_string(chart)
    }
    .context("Failed to serialize usage chart to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write usage chart to {}", output_path.display()))?;

    log::info!("Usage chart written to {}", output_path.display());
    Ok(())
}

fn render_text(summary: &UsageSummary) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    lines.push("=".repeat(80));
    lines.push("                        NETWORK USAGE ANALYSIS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    lines.push(format!("Analysis Date: {}", summary.analysis_timestamp));
    lines.push(format!("Events: {}", summary.total_events));
    lines.push(format!("Time span: {}", format_ms(summary.span_ms)));
    lines.push(format!("Windows: {} ({})", summary.window_count, summary.bucket_width));
    lines.push(String::new());

    lines.push("Transfers by category:".to_string());
    lines.push(format!(
        "  {:<28} {:>10} {:>14} {:>8}",
        "category", "transfers", "bytes", "peak"
    ));
    for cat in &summary.categories {
        lines.push(format!(
            "  {:<28} {:>10} {:>14} {:>8}",
            cat.category,
            cat.transfers,
            format_bytes(cat.total_bytes),
            cat.peak_concurrency
        ));
    }
    lines.push(String::new());

    lines.push(format!("Latency (mean over {} active windows):", summary.active_windows));
    lines.push(format!("  Ideal: {}", format_ms(summary.mean_latency_ideal_ms)));
    lines.push(format!("  Real:  {}", format_ms(summary.mean_latency_real_ms)));
    if let Some(slowdown) = summary.slowdown {
        lines.push(format!("  Real / ideal: {:.2}x", slowdown));
    }
    lines.push(String::new());

    lines
}

/// Generate human-readable text report
pub fn generate_text_report(summary: &UsageSummary, output_path: &Path) -> Result<()> {
    let text = render_text(summary).join("\n");

    fs::write(output_path, text)
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Print summary to console
pub fn print_summary(summary: &UsageSummary) {
    println!();
    println!("=== NETWORK USAGE SUMMARY ===");
    println!();
    println!("Events: {}  Windows: {} ({})", summary.total_events, summary.window_count, summary.bucket_width);
    for cat in &summary.categories {
        println!(
            "  {}: {} transfers, {}, peak {} in flight",
            cat.category,
            cat.transfers,
            format_bytes(cat.total_bytes),
            cat.peak_concurrency
        );
    }
    println!(
        "Latency: ideal {}, real {}",
        format_ms(summary.mean_latency_ideal_ms),
        format_ms(summary.mean_latency_real_ms)
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::chart::build_usage_chart;
    use chrono::{TimeDelta, TimeZone, Utc};
    use tempfile::TempDir;

    fn events() -> Vec<NetworkEvent> {
        let t0 = Utc.with_ymd_and_hms(2019, 5, 1, 12, 0, 0).unwrap();
        let event = |id: u64, object: &str, size: i64, start_ms: i64, end_ms: i64| NetworkEvent {
            from: "user-0".to_string(),
            to: "peer-0".to_string(),
            object: object.to_string(),
            size,
            start: t0 + TimeDelta::milliseconds(start_ms),
            end: t0 + TimeDelta::milliseconds(end_ms),
            local_bandwidth: 10_000,
            global_bandwidth: 100_000,
            id,
        };
        vec![
            event(1, "transaction", 1000, 0, 105),
            event(2, "transaction", 500, 20, 60),
            event(3, "endorsement", 2000, 160, 390),
        ]
    }

    #[test]
    fn test_summarize() {
        let events = events();
        let options = AnalysisOptions::default();
        let chart = build_usage_chart(&events, &options).unwrap();
        let summary = summarize(&events, &chart, &options);

        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.window_count, 8);
        assert_eq!(summary.bucket_width, "50ms");
        assert!((summary.span_ms - 390.0).abs() < 1e-9);

        let tx = summary.categories.iter().find(|c| c.category == "transaction").unwrap();
        assert_eq!(tx.transfers, 2);
        assert_eq!(tx.total_bytes, 1500);
        assert_eq!(tx.peak_concurrency, 2);

        let end = summary.categories.iter().find(|c| c.category == "endorsement").unwrap();
        assert_eq!(end.peak_concurrency, 1);
        assert!(summary.slowdown.is_some());
    }

    #[test]
    fn test_zero_latency_window_still_active() {
        // An empty, instantaneous transfer has zero ideal and real latency
        let mut events = events();
        events.truncate(1);
        events[0].size = 0;
        events[0].end = events[0].start;
        let later = NetworkEvent {
            id: 2,
            size: 1000,
            start: events[0].start + TimeDelta::milliseconds(120),
            end: events[0].start + TimeDelta::milliseconds(130),
            ..events[0].clone()
        };
        events.push(later);
        let options = AnalysisOptions::default();
        let chart = build_usage_chart(&events, &options).unwrap();

        assert_eq!(chart.latency_ideal, vec![0.0, 0.0, 100.0]);
        assert_eq!(chart.endpoint_counts, vec![2, 0, 2]);

        let summary = summarize(&events, &chart, &options);
        assert_eq!(summary.active_windows, 2);
        assert!((summary.mean_latency_ideal_ms - 50.0).abs() < 1e-9);
        assert!((summary.mean_latency_real_ms - 5.0).abs() < 1e-9);
        assert!((summary.slowdown.unwrap() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_generate_reports() {
        let dir = TempDir::new().unwrap();
        let events = events();
        let options = AnalysisOptions::default();
        let chart = build_usage_chart(&events, &options).unwrap();

        let json_path = dir.path().join("usage.json");
        generate_json_report(&chart, &json_path, false).unwrap();
        let restored: ChartData = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert!(restored.endpoint_counts.is_empty());
        assert!(restored.is_aligned());
        assert_eq!(restored, ChartData { endpoint_counts: Vec::new(), ..chart.clone() });

        let text_path = dir.path().join("usage.txt");
        generate_text_report(&summarize(&events, &chart, &options), &text_path).unwrap();
        let text = fs::read_to_string(&text_path).unwrap();
        assert!(text.contains("NETWORK USAGE ANALYSIS"));
        assert!(text.contains("endorsement"));
    }
}
