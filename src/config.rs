//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section is optional; missing values fall back to the defaults the
//! analysis modules use on their own.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::analysis::bankroll::{SimulationConfig, DEFAULT_BANKROLL_CANDIDATES};
use crate::analysis::metrics::DEFAULT_WINDOW_SIZES;
use crate::ingest::CrawlOptions;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub bankroll: BankrollConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub data_dirs: Vec<PathBuf>,
    pub follow_symlinks: bool,
    pub file_prefix: String,
    pub file_extension: String,
    pub include_freerolls: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let crawl = CrawlOptions::default();
        Self {
            data_dirs: Vec::new(),
            follow_symlinks: crawl.follow_symlinks,
            file_prefix: crawl.file_prefix,
            file_extension: crawl.file_extension,
            include_freerolls: false,
        }
    }
}

impl IngestConfig {
    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            follow_symlinks: self.follow_symlinks,
            file_prefix: self.file_prefix.clone(),
            file_extension: self.file_extension.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Symbol → units per USD, overriding the built-in table.
    pub rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    pub window_sizes: Vec<usize>,
    pub max_data_points: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window_sizes: DEFAULT_WINDOW_SIZES.to_vec(),
            max_data_points: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BankrollConfig {
    /// Starting bankrolls to evaluate, in buy-ins.
    pub candidates: Vec<f64>,
    pub runs_per_bankroll: u32,
    pub min_trial_cap: u64,
    pub trial_multiplier: u64,
    pub seed: Option<u64>,
    pub profit_exit_multiplier: Option<f64>,
}

impl Default for BankrollConfig {
    fn default() -> Self {
        let sim = SimulationConfig::default();
        Self {
            candidates: DEFAULT_BANKROLL_CANDIDATES.to_vec(),
            runs_per_bankroll: sim.runs_per_bankroll,
            min_trial_cap: sim.min_trial_cap,
            trial_multiplier: sim.trial_multiplier,
            seed: sim.seed,
            profit_exit_multiplier: sim.profit_exit_multiplier,
        }
    }
}

impl BankrollConfig {
    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            runs_per_bankroll: self.runs_per_bankroll,
            min_trial_cap: self.min_trial_cap,
            trial_multiplier: self.trial_multiplier,
            seed: self.seed,
            profit_exit_multiplier: self.profit_exit_multiplier,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("pokercraft_report.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }
}
