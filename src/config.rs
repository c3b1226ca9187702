use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "TIMSS_EXPLORER_CONFIG";
/// Settings file looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "timss-explorer.json";

/// Command-line arguments. Each one given overrides the settings file.
#[derive(Debug, Clone, Default, Parser)]
#[command(version, about = "Explore TIMSS student assessment data.")]
pub struct Cli {
    /// Dataset to open on start-up (.feather, .parquet, .json or .csv).
    pub data: Option<PathBuf>,

    /// Settings file.
    #[arg(long, value_name = "PATH", env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Bars per histogram.
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,
}

/// User settings, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Dataset opened on start-up.
    pub data_path: Option<PathBuf>,
    /// Schools pre-selected in the school filter.
    pub default_school_count: usize,
    /// Bars per histogram.
    pub histogram_bins: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_path: None,
            default_school_count: 5,
            histogram_bins: 20,
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing settings")
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                log::info!("Reading settings from {}", path.display());
                Self::from_json(&text).with_context(|| format!("in {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings file at {}, using defaults", path.display());
                Ok(Settings::default())
            }
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Settings from `--config`, `$TIMSS_EXPLORER_CONFIG` or `./timss-explorer.json`,
    /// then overridden by the remaining command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut settings = Self::load_from(&path)?;
        if let Some(data) = &cli.data {
            settings.data_path = Some(data.clone());
        }
        if let Some(bins) = cli.bins {
            settings.histogram_bins = bins;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let s = Settings::from_json(r#"{ "histogram_bins": 8 }"#).unwrap();
        assert_eq!(s.histogram_bins, 8);
        assert_eq!(s.default_school_count, 5);
        assert_eq!(s.data_path, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_json(r#"{ "bins": 8 }"#).is_err());
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn file_on_disk_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "data_path": "data/cleaned_data.feather" }"#).unwrap();
        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.data_path, Some(PathBuf::from("data/cleaned_data.feather")));
    }

    #[test]
    fn command_line_overrides_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "data_path": "old.feather", "histogram_bins": 8 }"#).unwrap();

        let config = path.to_str().unwrap();
        let cli = Cli::try_parse_from(["timss-explorer", "new.parquet", "--config", config]).unwrap();
        let s = Settings::load(&cli).unwrap();
        assert_eq!(s.data_path, Some(PathBuf::from("new.parquet")));
        assert_eq!(s.histogram_bins, 8);

        let cli = Cli::try_parse_from(["timss-explorer", "--config", config, "--bins", "12"]).unwrap();
        let s = Settings::load(&cli).unwrap();
        assert_eq!(s.data_path, Some(PathBuf::from("old.feather")));
        assert_eq!(s.histogram_bins, 12);
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["timss-explorer", "--bins", "many"]).is_err());
        assert!(Cli::try_parse_from(["timss-explorer", "a.csv", "b.csv"]).is_err());
        assert!(Cli::try_parse_from(["timss-explorer", "--verbose"]).is_err());
    }
}
