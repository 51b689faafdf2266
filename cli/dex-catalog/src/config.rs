//! Configuration types for relay client construction.

use std::collections::BTreeMap;

/// Configuration for relay client construction.
#[derive(Debug, Clone, Default)]
pub struct CatalogClientConfig {
    /// Base URL of the relay, without the `/api` prefix.
    pub relay_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Override for the `user-agent` header.
    pub user_agent: Option<String>,
}

impl CatalogClientConfig {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            ..Default::default()
        }
    }
}
