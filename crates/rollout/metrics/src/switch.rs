//! Authority switch of the governed component

use crate::config::MetricsConfig;
use crate::error::{MetricsError, MetricsResult};
use async_trait::async_trait;
use reqwest::Client;
use rollout_types::AuthorityLevel;
use serde::Serialize;
use tracing::{info, instrument};

/// Applies an authority level to the governed component
#[async_trait]
pub trait AuthoritySwitch: Send + Sync {
    /// Put the governed component into `level`
    async fn apply(&self, level: AuthorityLevel) -> MetricsResult<()>;
}

#[derive(Debug, Serialize)]
struct SwitchRequest {
    level: AuthorityLevel,
}

/// HTTP switch: POST `{ "level": "<level>" }`
pub struct HttpAuthoritySwitch {
    client: Client,
    url: String,
}

impl HttpAuthoritySwitch {
    pub fn new(config: &MetricsConfig) -> MetricsResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            url: config.switch_url.clone(),
        })
    }
}

#[async_trait]
impl AuthoritySwitch for HttpAuthoritySwitch {
    #[instrument(skip(self), fields(level = %level))]
    async fn apply(&self, level: AuthorityLevel) -> MetricsResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&SwitchRequest { level })
            .send()
            .await
            .map_err(|e| MetricsError::Switch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MetricsError::Switch(format!(
                "{} returned status {}: {}",
                self.url,
                status.as_u16(),
                message
            )));
        }

        info!("Authority switch applied");
        Ok(())
    }
}
