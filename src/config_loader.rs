use crate::config::{AnalyzerConfig, BandwidthConfig};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<AnalyzerConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: AnalyzerConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Command-line settings that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub window: Option<Duration>,
    pub divisions: Option<u32>,
    pub bandwidth: Option<u64>,
    pub per_event_bandwidth: bool,
    pub pretty: bool,
    pub cache: bool,
    pub no_text_report: bool,
}

/// Apply CLI overrides to a configuration
pub fn apply_cli_overrides(config: &mut AnalyzerConfig, overrides: &CliOverrides) -> Result<()> {
    // A window given on the command line replaces whichever sizing the file used
    if let Some(width) = overrides.window {
        info!("Window width override: {:?}", width);
        config.window.width = Some(width);
        config.window.divisions = None;
    }
    if let Some(divisions) = overrides.divisions {
        info!("Window divisions override: {}", divisions);
        config.window.divisions = Some(divisions);
        config.window.width = None;
    }

    if let Some(bytes_per_sec) = overrides.bandwidth {
        info!("Nominal bandwidth override: {} B/s", bytes_per_sec);
        config.bandwidth = BandwidthConfig::Fixed { bytes_per_sec };
    } else if overrides.per_event_bandwidth {
        info!("Using per-event bandwidth for ideal latency");
        config.bandwidth = BandwidthConfig::PerEvent;
    }

    if overrides.pretty {
        config.output.pretty = true;
    }
    if overrides.cache {
        config.input.cache = true;
    }
    if overrides.no_text_report {
        config.output.text_report = false;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BandwidthPolicy, BucketWidth};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window:\n  divisions: 500\noutput:\n  pretty: true").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.window.divisions, Some(500));
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window:\n  width: 10ms\n  divisions: 5").unwrap();
        assert!(load_config(file.path()).is_err());

        assert!(load_config(Path::new("/nonexistent/analyzer.yaml")).is_err());
    }

    #[test]
    fn test_window_override_replaces_divisions() {
        let mut config = AnalyzerConfig::default();
        config.window.divisions = Some(1000);

        let overrides = CliOverrides {
            window: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        apply_cli_overrides(&mut config, &overrides).unwrap();

        assert_eq!(config.window.divisions, None);
        assert_eq!(config.window.width, Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_bandwidth_overrides() {
        let mut config = AnalyzerConfig::default();
        let overrides = CliOverrides {
            bandwidth: Some(8000),
            per_event_bandwidth: true,
            ..Default::default()
        };
        apply_cli_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.bandwidth_policy(), BandwidthPolicy::Fixed(8000));

        let mut config = AnalyzerConfig::default();
        let overrides = CliOverrides {
            per_event_bandwidth: true,
            divisions: Some(1000),
            no_text_report: true,
            ..Default::default()
        };
        apply_cli_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.bandwidth_policy(), BandwidthPolicy::PerEvent);
        assert_eq!(config.bucket_width().unwrap(), BucketWidth::Divisions(1000));
        assert!(!config.output.text_report);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut config = AnalyzerConfig::default();
        let overrides = CliOverrides {
            bandwidth: Some(0),
            ..Default::default()
        };
        assert!(apply_cli_overrides(&mut config, &overrides).is_err());
    }
}
