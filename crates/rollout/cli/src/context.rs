//! Wiring of stores, collaborators and components from configuration

use crate::config::{RolloutConfig, StoreConfig};
use crate::error::CliResult;
use crate::output::OutputFormat;
use rollout_controller::TransitionController;
use rollout_metrics::{
    HealthChecker, HttpAuthoritySwitch, HttpHealthChecker, HttpMetricsClient, MetricsSource,
};
use rollout_store::{InMemoryModeStore, RolloutStore, SqliteModeStore};
use rollout_validator::ReadinessValidator;
use std::sync::Arc;
use tracing::warn;

/// Everything a command needs
pub struct Context {
    pub config: RolloutConfig,
    pub output: OutputFormat,
    pub store: Arc<dyn RolloutStore>,
    pub metrics: Arc<dyn MetricsSource>,
    pub validator: ReadinessValidator,
    pub controller: Arc<TransitionController>,
}

impl Context {
    pub async fn build(config: RolloutConfig, output: OutputFormat) -> CliResult<Self> {
        let store: Arc<dyn RolloutStore> = match &config.store {
            StoreConfig::Memory => {
                warn!("Using the in-memory store; mode state will not survive this process");
                Arc::new(InMemoryModeStore::new())
            }
            StoreConfig::Sqlite {
                url,
                max_connections,
            } => Arc::new(SqliteModeStore::connect(url, *max_connections).await?),
        };

        let metrics: Arc<dyn MetricsSource> = Arc::new(HttpMetricsClient::new(&config.metrics)?);
        let health: Arc<dyn HealthChecker> = Arc::new(HttpHealthChecker::new(&config.metrics)?);
        let switch = Arc::new(HttpAuthoritySwitch::new(&config.metrics)?);

        let validator = ReadinessValidator::new(
            config.validator.clone(),
            metrics.clone(),
            health.clone(),
            store.clone(),
        );
        let controller = Arc::new(TransitionController::new(
            config.controller.clone(),
            store.clone(),
            metrics.clone(),
            health,
            switch,
        ));

        Ok(Self {
            config,
            output,
            store,
            metrics,
            validator,
            controller,
        })
    }
}
