//! Configuration file support for the analysis run and the dashboard.
//!
//! Every field has a default, so an absent file or a partial file is fine.
//! Command-line flags override whatever the file says.
//!
//! ```toml
//! [analysis]
//! input = "metadata.csv"
//! fallback = "missing-only"
//! trend_years = [2020, 2021]
//!
//! [dashboard]
//! snapshot = "cord19_cleaned_data.csv"
//! sample_size = 2000
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::charts::ChartOptions;
use crate::data::loader::{FallbackPolicy, LoadOptions};
use crate::data::synth::{DEFAULT_SAMPLE_SIZE, DEFAULT_SEED};
use crate::error::{ExplorerError, Result};

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExplorerError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            ExplorerError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// Settings for the batch analysis binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub charts: PathBuf,
    pub seed: u64,
    pub sample_size: usize,
    pub fallback: FallbackPolicy,
    pub top_journals: usize,
    pub top_words: usize,
    pub trend_years: Vec<i32>,
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("metadata.csv"),
            output: PathBuf::from("cord19_cleaned_data.csv"),
            charts: PathBuf::from("cord19_charts.json"),
            seed: DEFAULT_SEED,
            sample_size: DEFAULT_SAMPLE_SIZE,
            fallback: FallbackPolicy::Always,
            top_journals: 10,
            top_words: 20,
            trend_years: vec![2020, 2021],
            histogram_bins: 30,
        }
    }
}

impl AnalysisConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            fallback: self.fallback,
            seed: self.seed,
            sample_size: self.sample_size,
        }
    }

    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            top_journals: self.top_journals,
            top_words: self.top_words.min(10),
            trend_years: self.trend_years.iter().copied().collect::<BTreeSet<_>>(),
            histogram_bins: self.histogram_bins,
        }
    }
}

/// Settings for the interactive dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub snapshot: PathBuf,
    pub seed: u64,
    pub sample_size: usize,
    pub fallback: FallbackPolicy,
    pub top_journals: usize,
    pub sample_rows: usize,
    pub histogram_bins: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("cord19_cleaned_data.csv"),
            seed: DEFAULT_SEED,
            sample_size: 2000,
            fallback: FallbackPolicy::Always,
            top_journals: 15,
            sample_rows: 20,
            histogram_bins: 30,
        }
    }
}

impl DashboardConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            fallback: self.fallback,
            seed: self.seed,
            sample_size: self.sample_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cord.toml");
        std::fs::write(
            &path,
            "[analysis]\ninput = \"papers.parquet\"\nfallback = \"missing-only\"\n\n[dashboard]\nsample_size = 10\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.analysis.input, PathBuf::from("papers.parquet"));
        assert_eq!(config.analysis.fallback, FallbackPolicy::MissingOnly);
        assert_eq!(config.analysis.seed, DEFAULT_SEED);
        assert_eq!(config.dashboard.sample_size, 10);
        assert_eq!(config.dashboard.top_journals, 15);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cord.toml");
        std::fs::write(&path, "[analysis]\nseed = \"not a number\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ExplorerError::Config(_))));
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
