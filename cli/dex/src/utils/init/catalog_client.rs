use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, bail};
use dex_catalog::{
    CatalogClientConfig,
    Client,
    DEX_CATALOG_MOCK_DATA_VAR,
    MockClient,
    RelayClient,
};
use tracing::debug;
use url::Url;

use crate::config::Config;

/// Initialize the catalog client
///
/// - Initialize a mock client if `_DEX_USE_CATALOG_MOCK` points to a mock data file
/// - Initialize a client for the configured relay otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client, anyhow::Error> {
    if let Ok(path_str) = std::env::var(DEX_CATALOG_MOCK_DATA_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        return Ok(MockClient::new(Some(path))?.into());
    }

    let relay_url = Url::parse(&config.relay_url)
        .with_context(|| format!("invalid relay url '{}'", config.relay_url))?;
    if !matches!(relay_url.scheme(), "http" | "https") {
        bail!("relay url must use http or https: {relay_url}");
    }

    let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();

    // Pass in a bool if we are running in CI, so requests can reflect this in the headers
    if std::env::var("CI").is_ok() {
        extra_headers.insert("dex-ci".to_string(), "true".to_string());
    };

    debug!(%relay_url, "using relay catalog client");
    let client = RelayClient::new(CatalogClientConfig {
        relay_url: config.relay_url.clone(),
        extra_headers,
        user_agent: None,
    })?;
    Ok(client.into())
}
