//! Configuration file support for weightlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/weightlog/config.toml`.

use crate::projection::{DEFAULT_AVERAGE_WINDOW_DAYS, DEFAULT_PROJECTION_DAYS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Which user the CLI acts for when `--user` is omitted
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub default_id: Option<String>,
}

/// How the theoretical-weight reply is computed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TheoreticalWeightMode {
    /// Report the stored starting weight unchanged
    #[default]
    Baseline,
    /// Report today's end-of-day theoretical weight
    EndOfDay,
}

/// Energy-model parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    #[serde(default = "default_projection_days")]
    pub projection_days: u32,

    #[serde(default = "default_average_window_days")]
    pub average_window_days: u32,

    #[serde(default)]
    pub theoretical_weight: TheoreticalWeightMode,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            projection_days: default_projection_days(),
            average_window_days: default_average_window_days(),
            theoretical_weight: TheoreticalWeightMode::default(),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("weightlog")
}

fn default_projection_days() -> u32 {
    DEFAULT_PROJECTION_DAYS
}

fn default_average_window_days() -> u32 {
    DEFAULT_AVERAGE_WINDOW_DAYS
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("weightlog")
            .join("config.toml")
    }

    /// Reject settings the model cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.model.projection_days == 0 {
            return Err(Error::Config("model.projection_days must be at least 1".into()));
        }
        if self.model.average_window_days == 0 {
            return Err(Error::Config(
                "model.average_window_days must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
