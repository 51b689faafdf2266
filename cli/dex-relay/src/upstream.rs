//! Client for the remote API the relay forwards to.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::state::RelayConfig;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to build upstream client")]
    Build(#[source] reqwest::Error),
    #[error("failed to reach upstream")]
    Request(#[source] reqwest::Error),
    #[error("upstream responded with {0}")]
    Status(StatusCode),
    #[error("failed to decode upstream response")]
    Decode(#[source] reqwest::Error),
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::Status(StatusCode::NOT_FOUND))
    }
}

#[derive(Debug)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: String,
}

impl Upstream {
    pub fn new(config: &RelayConfig) -> Result<Self, UpstreamError> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("dex-relay/{}", env!("CARGO_PKG_VERSION")));
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .user_agent(user_agent)
            .build()
            .map_err(UpstreamError::Build)?;
        Ok(Self {
            client,
            base_url: config.upstream_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}/{path}` and return the JSON body unchanged.
    #[instrument(skip(self, query), fields(upstream = %self.base_url))]
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .query(query)
            .send()
            .await
            .map_err(UpstreamError::Request)?;

        let status = response.status();
        debug!(%status, "upstream responded");
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }
        response.json().await.map_err(UpstreamError::Decode)
    }
}
