use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ChurnError, Result};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub churn: ChurnConfig,
    pub model: ModelConfig,
    pub analytics: AnalyticsConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

/// Feature derivation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnConfig {
    /// Days of inactivity after which a customer is labeled churned
    pub inactivity_days: i64,
}

/// Classifier training settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Probability at or above which a customer is predicted churned
    pub decision_threshold: f64,
    /// Optimizer iteration cap for logistic regression
    pub max_iterations: u64,
    /// Seed for the train/holdout shuffle
    pub seed: u64,
    /// Fraction of snapshots held out for evaluation
    pub holdout_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Percentile-rank cutoff for the top-spender report
    pub top_spender_fraction: f64,
    pub tiers: PriorityTiers,
}

/// Spend and risk boundaries for the retention priority listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityTiers {
    /// Lifetime spend at or above which a customer counts as high value
    pub high_value_spend: f64,
    /// Lifetime spend at or above which a customer counts as mid value
    pub mid_value_spend: f64,
    /// Churn probability at or above which a customer counts as high risk
    pub high_risk_probability: f64,
    /// Churn probability at or above which a customer counts as medium risk
    pub medium_risk_probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub default_format: String,
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: "data/churn.db".to_string(),
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            churn: ChurnConfig { inactivity_days: 90 },
            model: ModelConfig {
                decision_threshold: 0.5,
                max_iterations: 100,
                seed: 42,
                holdout_fraction: 0.2,
            },
            analytics: AnalyticsConfig {
                top_spender_fraction: 0.1,
                tiers: PriorityTiers {
                    high_value_spend: 10_000.0,
                    mid_value_spend: 5_000.0,
                    high_risk_probability: 0.7,
                    medium_risk_probability: 0.4,
                },
            },
            export: ExportConfig {
                default_format: "csv".to_string(),
                output_directory: "./reports".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| ChurnError::InvalidConfig(format!("failed to build defaults: {e}")))?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("CHURN").separator("__"))
            .build()
            .map_err(|e| ChurnError::InvalidConfig(format!("failed to load configuration: {e}")))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| ChurnError::InvalidConfig(format!("failed to deserialize configuration: {e}")))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        if self.database.path.trim().is_empty() {
            return Err(ChurnError::InvalidConfig(
                "database.path must not be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ChurnError::InvalidConfig(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(ChurnError::InvalidConfig(
                "connection_timeout_secs must be greater than 0".to_string(),
            ));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ChurnError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                self.logging.level
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ChurnError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {valid_formats:?}",
                self.logging.format
            )));
        }

        // Validate churn config
        if self.churn.inactivity_days < 0 {
            return Err(ChurnError::InvalidConfig(
                "inactivity_days must not be negative".to_string(),
            ));
        }

        // Validate model config
        if !(0.0..=1.0).contains(&self.model.decision_threshold) {
            return Err(ChurnError::InvalidConfig(
                "decision_threshold must be within [0, 1]".to_string(),
            ));
        }
        if self.model.max_iterations == 0 {
            return Err(ChurnError::InvalidConfig(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.model.holdout_fraction) {
            return Err(ChurnError::InvalidConfig(
                "holdout_fraction must be within [0, 1)".to_string(),
            ));
        }

        // Validate analytics config
        if self.analytics.top_spender_fraction <= 0.0 || self.analytics.top_spender_fraction > 1.0 {
            return Err(ChurnError::InvalidConfig(
                "top_spender_fraction must be within (0, 1]".to_string(),
            ));
        }
        self.analytics.tiers.validate()?;

        // Validate export config
        let valid_formats = ["csv", "json"];
        if !valid_formats.contains(&self.export.default_format.as_str()) {
            return Err(ChurnError::InvalidConfig(format!(
                "Invalid export format: {}. Must be one of: {valid_formats:?}",
                self.export.default_format
            )));
        }

        Ok(())
    }

    /// Get database path from environment or config
    #[must_use]
    pub fn get_database_path(&self) -> String {
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| self.database.path.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

impl PriorityTiers {
    /// Validate boundary ordering and probability ranges
    pub fn validate(&self) -> Result<()> {
        if self.high_value_spend < self.mid_value_spend {
            return Err(ChurnError::InvalidConfig(
                "high_value_spend must be at least mid_value_spend".to_string(),
            ));
        }
        if self.mid_value_spend < 0.0 {
            return Err(ChurnError::InvalidConfig(
                "mid_value_spend must not be negative".to_string(),
            ));
        }
        for (name, probability) in [
            ("high_risk_probability", self.high_risk_probability),
            ("medium_risk_probability", self.medium_risk_probability),
        ] {
            if !(0.0..=1.0).contains(&probability) {
                return Err(ChurnError::InvalidConfig(format!(
                    "{name} must be within [0, 1]"
                )));
            }
        }
        if self.high_risk_probability < self.medium_risk_probability {
            return Err(ChurnError::InvalidConfig(
                "high_risk_probability must be at least medium_risk_probability".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, "data/churn.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.churn.inactivity_days, 90);
        assert!((config.model.decision_threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        let mut config = AppConfig::default();
        config.model.decision_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_tiers_are_rejected() {
        let mut config = AppConfig::default();
        config.analytics.tiers.mid_value_spend = config.analytics.tiers.high_value_spend + 1.0;
        assert!(config.validate().is_err());
    }
}
