//! Network usage analysis CLI for simulator runs.
//!
//! Reads a network event log and writes `usage.json` (per-category
//! concurrency and ideal vs. real latency over time) plus a text summary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;

use network_analyzer::analysis::{self, cache, report};
use network_analyzer::config::AnalyzerConfig;
use network_analyzer::config_loader::{self, CliOverrides};
use network_analyzer::utils::duration::parse_duration;

#[derive(Parser, Debug)]
#[command(name = "network-analyzer")]
#[command(about = "Utility to analyze network traffic after a simulator run")]
#[command(version)]
struct Cli {
    /// JSON file with network log
    #[arg(short, long)]
    input: PathBuf,

    /// Directory to write output files to
    #[arg(short, long)]
    output: PathBuf,

    /// Optional YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window width, e.g. "50ms" or "1s" (bare numbers are milliseconds)
    #[arg(long, value_parser = parse_duration, conflicts_with = "divisions")]
    window: Option<Duration>,

    /// Split the log's time span into this many windows instead
    #[arg(long)]
    divisions: Option<u32>,

    /// Nominal bandwidth in bytes/s for ideal latency [default: first event's local bandwidth]
    #[arg(long, conflicts_with = "per_event_bandwidth")]
    bandwidth: Option<u64>,

    /// Compute ideal latency against each event's own local bandwidth
    #[arg(long)]
    per_event_bandwidth: bool,

    /// Pretty-print the JSON chart
    #[arg(long)]
    pretty: bool,

    /// Cache the parsed log beside the input file
    #[arg(long)]
    cache: bool,

    /// Skip the text report
    #[arg(long)]
    no_text_report: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of parallel workers for log parsing (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            window: self.window,
            divisions: self.divisions,
            bandwidth: self.bandwidth,
            per_event_bandwidth: self.per_event_bandwidth,
            pretty: self.pretty,
            cache: self.cache,
            no_text_report: self.no_text_report,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    // Set thread pool size
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .wrap_err("Failed to configure thread pool")?;
    }

    if !cli.input.is_file() {
        bail!("Input file does not exist: {}", cli.input.display());
    }
    if !cli.output.is_dir() {
        bail!("Output directory does not exist: {}", cli.output.display());
    }

    let mut config = match &cli.config {
        Some(path) => config_loader::load_config(path)?,
        None => AnalyzerConfig::default(),
    };
    config_loader::apply_cli_overrides(&mut config, &cli.overrides())?;
    let options = config.analysis_options()?;

    info!("Loading network log from {}...", cli.input.display());
    let events = if config.input.cache {
        cache::load_with_cache(&cli.input)?
    } else {
        analysis::load_network_log(&cli.input)?
    };
    info!("Log size: {}", events.len());

    let chart = analysis::build_usage_chart(&events, &options)
        .wrap_err_with(|| format!("Failed to analyze {}", cli.input.display()))?;

    analysis::generate_json_report(
        &chart,
        &cli.output.join(&config.output.file_name),
        config.output.pretty,
    )?;

    let summary = analysis::summarize(&events, &chart, &options);
    if config.output.text_report {
        let text_name = Path::new(&config.output.file_name).with_extension("txt");
        analysis::generate_text_report(&summary, &cli.output.join(text_name))?;
    }
    report::print_summary(&summary);

    info!("Analysis complete. Reports written to {}", cli.output.display());
    Ok(())
}
