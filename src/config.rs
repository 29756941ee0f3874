use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use crate::strategy::{Confidence, DEFAULT_RISK_FREE_RATE};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Lookback window for calibration, agent and category views
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    /// Rows shown by `recent`
    #[serde(default = "default_recent_limit")]
    pub recent_limit: i64,
}

fn default_window_days() -> i64 {
    90
}

fn default_recent_limit() -> i64 {
    20
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            recent_limit: default_recent_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    #[serde(default)]
    pub default_confidence: Confidence,
    /// Annual risk-free rate used by payout analysis
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: Decimal,
    /// Bankroll used for dollar sizing when none is given
    #[serde(default)]
    pub bankroll: Option<f64>,
}

fn default_risk_free_rate() -> Decimal {
    DEFAULT_RISK_FREE_RATE
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            default_confidence: Confidence::default(),
            risk_free_rate: default_risk_free_rate(),
            bankroll: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("database.url", "sqlite://data/maverick.db")?
            .set_default("database.max_connections", 5)?
            .set_default("logging.level", "warn")?
            .set_default("logging.json", false)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific overrides (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("MAVERICK_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // MAVERICK_DATABASE__URL, MAVERICK_ANALYTICS__WINDOW_DAYS, ...
            .add_source(
                Environment::with_prefix("MAVERICK")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Configuration for a database URL with everything else defaulted
    pub fn with_database(url: &str) -> Self {
        Self {
            database: DatabaseConfig {
                url: url.to_string(),
                max_connections: default_max_connections(),
            },
            analytics: AnalyticsConfig::default(),
            sizing: SizingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be at least 1".to_string());
        }

        if self.analytics.window_days <= 0 {
            errors.push("analytics.window_days must be positive".to_string());
        }

        if self.analytics.recent_limit <= 0 {
            errors.push("analytics.recent_limit must be positive".to_string());
        }

        if self.sizing.risk_free_rate < Decimal::ZERO || self.sizing.risk_free_rate >= Decimal::ONE {
            errors.push("sizing.risk_free_rate must be in [0, 1)".to_string());
        }

        if let Some(bankroll) = self.sizing.bankroll {
            if bankroll <= 0.0 {
                errors.push("sizing.bankroll must be positive".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
