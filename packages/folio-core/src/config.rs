//! Engine configuration.
//!
//! Settings come from an optional TOML file, then environment overrides:
//!
//! - `FOLIO_CONFIG`: path of the config file (default `<config dir>/folio/config.toml`)
//! - `FOLIO_DATA_DIR`: directory holding `<SYMBOL>.csv` price files

use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Annual risk-free rate used by Sharpe and Sortino when none is configured.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Runtime settings for the engine and its CSV price provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory containing per-symbol price files
    pub data_dir: PathBuf,
    /// Annual risk-free rate for risk-adjusted ratios
    pub risk_free_rate: f64,
    /// Symbols to load into the price cache at start-up
    pub preload: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data_cache"),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            preload: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from `path` (defaults when the file is absent) and apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_path(path)?;
        if let Ok(dir) = env::var("FOLIO_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    /// Read a config file without environment overrides.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Replace `data_dir` when an explicit value (e.g. a CLI flag) is given.
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default config file path.
    ///
    /// Can be overridden with the `FOLIO_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("folio/config.toml"))
            .unwrap_or_else(|| PathBuf::from("folio.toml"))
    }
}
