//! Shared state and configuration for relay handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::upstream::{Upstream, UpstreamError};

pub const DEFAULT_UPSTREAM_URL: &str = "https://pokeapi.co/api/v2";

/// Server-side configuration for the relay.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Base URL of the remote API, e.g. `https://pokeapi.co/api/v2`.
    pub upstream_url: String,
    /// Optional request timeout for handlers.
    pub request_timeout: Option<Duration>,
    /// Optional concurrency limit for handlers.
    pub concurrency_limit: Option<usize>,
    /// Override for the `user-agent` sent upstream.
    pub user_agent: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            request_timeout: None,
            concurrency_limit: None,
            user_agent: None,
        }
    }
}

/// Shared state for relay handlers.
#[derive(Debug, Clone)]
pub struct RelayState {
    pub upstream: Arc<Upstream>,
    pub config: RelayConfig,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Result<Self, UpstreamError> {
        let upstream = Upstream::new(&config)?;
        Ok(Self {
            upstream: Arc::new(upstream),
            config,
        })
    }
}
