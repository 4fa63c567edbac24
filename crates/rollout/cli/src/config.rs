//! Configuration for rolloutctl
//!
//! Layered as defaults, then an optional TOML file, then `ROLLOUT_`
//! environment variables (`__` separates nested keys, e.g.
//! `ROLLOUT_CONTROLLER__SETTLE_PERIOD_SECS=10`).

use rollout_controller::ControllerConfig;
use rollout_metrics::MetricsConfig;
use rollout_monitor::MonitorConfig;
use rollout_types::Environment;
use rollout_validator::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutConfig {
    /// Deployment environment; production asks before transitions
    #[serde(default)]
    pub environment: Environment,

    /// Mode state store
    #[serde(default)]
    pub store: StoreConfig,

    /// Collaborator endpoints
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Readiness validation thresholds
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Transition controller settings
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Trend monitor settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory for rendered readiness reports
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreConfig::default(),
            metrics: MetricsConfig::default(),
            validator: ValidatorConfig::default(),
            controller: ControllerConfig::default(),
            monitor: MonitorConfig::default(),
            logging: LoggingConfig::default(),
            report_dir: default_report_dir(),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-memory store (state is lost on exit)
    Memory,

    /// SQLite database
    Sqlite {
        /// Connection URL, e.g. `sqlite://rollout.db`
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Sqlite {
            url: "sqlite://rollout.db".to_string(),
            max_connections: default_pool_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}

impl RolloutConfig {
    /// Load configuration from defaults, an optional file and the process environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_with_env(
        path: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&RolloutConfig::default())?);

        // An explicit file must exist
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Add environment variables with ROLLOUT_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("ROLLOUT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RolloutConfig::load_with_env(None, Some(HashMap::new())).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.controller.max_transition_attempts, 3);
        assert_eq!(config.controller.settle_period_secs, 30);
        assert_eq!(config.monitor.poll_interval_secs, 60);
        assert_eq!(config.metrics.retry.max_attempts, 3);
        assert!(matches!(config.store, StoreConfig::Sqlite { .. }));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
environment = "production"

[store]
type = "memory"

[controller]
settle_period_secs = 5

[[validator.services]]
name = "orchestrator"
health_url = "http://orchestrator/health"
"#
        )
        .unwrap();

        let env = HashMap::from([(
            "ROLLOUT_CONTROLLER__SETTLE_PERIOD_SECS".to_string(),
            "12".to_string(),
        )]);
        let config = RolloutConfig::load_with_env(file.path().to_str(), Some(env)).unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.controller.settle_period_secs, 12);
        assert_eq!(config.validator.services.len(), 1);
        assert_eq!(config.validator.min_quality, 0.75);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = RolloutConfig::load_with_env(
            Some("/nonexistent/rollout.toml"),
            Some(HashMap::new()),
        );
        assert!(result.is_err());
    }
}
