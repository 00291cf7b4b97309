//! Analyzer configuration.
//!
//! Every field is optional; an empty file (or no file at all) reproduces the
//! charts of earlier tooling: 50 ms windows, first-event bandwidth,
//! `usage.json`.
//!
//! ```yaml
//! window:
//!   width: 50ms          # or: divisions: 1000
//! bandwidth:
//!   policy: fixed        # first_event | per_event | fixed
//!   bytes_per_sec: 10000
//! output:
//!   file_name: usage.json
//!   pretty: false
//!   text_report: true
//! input:
//!   cache: false
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisOptions, BandwidthPolicy, BucketWidth};
use crate::utils::duration::to_time_delta;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub bandwidth: BandwidthConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// Window sizing. At most one of `width` and `divisions` may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub width: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisions: Option<u32>,
}

/// Nominal bandwidth used for ideal latency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BandwidthConfig {
    #[default]
    FirstEvent,
    PerEvent,
    Fixed { bytes_per_sec: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub pretty: bool,
    #[serde(default = "default_true")]
    pub text_report: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Keep a compressed copy of the parsed log beside the input
    #[serde(default)]
    pub cache: bool,
}

fn default_file_name() -> String {
    "usage.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            pretty: false,
            text_report: true,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid window configuration: {0}")]
    InvalidWindow(String),
    #[error("Invalid bandwidth configuration: {0}")]
    InvalidBandwidth(String),
    #[error("Invalid output configuration: {0}")]
    InvalidOutput(String),
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bucket_width()?;

        if let BandwidthConfig::Fixed { bytes_per_sec } = self.bandwidth {
            if bytes_per_sec == 0 {
                return Err(ConfigError::InvalidBandwidth("bytes_per_sec must be positive".to_string()));
            }
            if i64::try_from(bytes_per_sec).is_err() {
                return Err(ConfigError::InvalidBandwidth(format!(
                    "bytes_per_sec too large: {}",
                    bytes_per_sec
                )));
            }
        }

        let name = &self.output.file_name;
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidOutput("file_name must not be empty".to_string()));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(ConfigError::InvalidOutput(format!(
                "file_name must be a plain file name, got '{}'",
                name
            )));
        }
        // The text report is written beside the chart with a .txt extension
        if Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        {
            return Err(ConfigError::InvalidOutput(format!(
                "file_name '{}' would be overwritten by the text report",
                name
            )));
        }

        Ok(())
    }

    pub fn bucket_width(&self) -> Result<BucketWidth, ConfigError> {
        match (self.window.width, self.window.divisions) {
            (Some(_), Some(_)) => Err(ConfigError::InvalidWindow(
                "set either width or divisions, not both".to_string(),
            )),
            (Some(width), None) => {
                if width.is_zero() {
                    return Err(ConfigError::InvalidWindow("width must be positive".to_string()));
                }
                to_time_delta(width)
                    .map(BucketWidth::Fixed)
                    .map_err(ConfigError::InvalidWindow)
            }
            (None, Some(0)) => Err(ConfigError::InvalidWindow("divisions must be positive".to_string())),
            (None, Some(n)) => Ok(BucketWidth::Divisions(n)),
            (None, None) => Ok(BucketWidth::default()),
        }
    }

    pub fn bandwidth_policy(&self) -> BandwidthPolicy {
        match self.bandwidth {
            BandwidthConfig::FirstEvent => BandwidthPolicy::FirstEvent,
            BandwidthConfig::PerEvent => BandwidthPolicy::PerEvent,
            BandwidthConfig::Fixed { bytes_per_sec } => {
                BandwidthPolicy::Fixed(i64::try_from(bytes_per_sec).unwrap_or(i64::MAX))
            }
        }
    }

    /// Options for the usage computation
    pub fn analysis_options(&self) -> Result<AnalysisOptions, ConfigError> {
        Ok(AnalysisOptions {
            bucket_width: self.bucket_width()?,
            bandwidth: self.bandwidth_policy(),
        })
    }
}
