//! Configuration management for the scoring service and training job

use crate::types::prediction::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable that overrides the configuration file location
pub const CONFIG_PATH_ENV: &str = "FRAUDSHIELD_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub training: TrainingConfig,
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Seconds between serving statistics summaries in the log (0 disables)
    pub stats_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            stats_interval_secs: 60,
        }
    }
}

/// Locations of the training artifacts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory holding all artifacts
    pub models_dir: String,
    /// Serialized classifier
    pub model_file: String,
    /// Column schema (JSON array)
    pub columns_file: String,
    /// Feature importance (JSON object)
    pub importance_file: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            model_file: "fraud_model.json".to_string(),
            columns_file: "model_columns.json".to_string(),
            importance_file: "feature_importance.json".to_string(),
        }
    }
}

/// Offline training configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Labelled transactions CSV
    pub data_path: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the train/evaluation shuffle
    pub seed: u64,
    /// Solver iteration cap
    pub max_iter: u64,
    /// Stop once the gradient norm is below this
    pub tolerance: f64,
    /// Inverse L2 regularization strength
    pub c: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: "data/raw/fraud_transactions_sample.csv".to_string(),
            test_size: 0.25,
            seed: 42,
            max_iter: 1000,
            tolerance: 1e-4,
            c: 1.0,
        }
    }
}

/// Detection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Probability above which a transaction is labelled fraud
    pub threshold: f64,
    /// Risk band boundaries
    pub risk_levels: RiskLevelThresholds,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            risk_levels: RiskLevelThresholds::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$FRAUDSHIELD_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file falls back to defaults. `FRAUDSHIELD__SECTION__KEY`
    /// environment variables override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("FRAUDSHIELD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make training or scoring meaningless
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection.threshold) {
            anyhow::bail!(
                "detection.threshold must be within [0, 1], got {}",
                self.detection.threshold
            );
        }
        if !(self.training.test_size > 0.0 && self.training.test_size < 1.0) {
            anyhow::bail!(
                "training.test_size must be within (0, 1), got {}",
                self.training.test_size
            );
        }
        if self.training.c <= 0.0 {
            anyhow::bail!("training.c must be positive, got {}", self.training.c);
        }
        let levels = &self.detection.risk_levels;
        if levels.medium > levels.high {
            anyhow::bail!(
                "detection.risk_levels.medium ({}) exceeds high ({})",
                levels.medium,
                levels.high
            );
        }
        Ok(())
    }
}
