//! Catalog client talking to the relay.

use std::fmt::Debug;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use tracing::{debug, instrument};

use crate::MapRelayResponseExt;
use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, DetailError, ListError, SearchError, TypesError};
use crate::mock::MockClient;
use crate::types::*;

const API_PREFIX: &str = "api/pokemon";

/// The complete relay interface consumed by the loader and front end.
///
/// This trait enables alternate implementations:
/// - **HTTP**: calls to the relay via [`RelayClient`]
/// - **Mock**: canned responses without HTTP via [`MockClient`]
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Fetch one page of the catalog list.
    async fn list(&self, offset: u32, limit: NonZeroU32) -> Result<ListPage, ListError>;

    /// Fetch the detail record of a single item.
    async fn detail(&self, id: &ItemId) -> Result<CatalogItemDetail, DetailError>;

    /// Fetch the taxonomy of category tags.
    async fn types(&self) -> Result<TypeList, TypesError>;

    /// Look up an item by exact name or number.
    async fn search(
        &self,
        query: impl AsRef<str> + Send + Sync,
    ) -> Result<SearchResponse, SearchError>;
}

/// Either a client for the actual relay,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Relay(RelayClient),
    Mock(MockClient),
}

/// A client for the relay service.
///
/// Handles HTTP client configuration with timeouts and extra headers,
/// and translates relay responses into the catalog error taxonomy.
pub struct RelayClient {
    client: reqwest::Client,
    config: CatalogClientConfig,
}

impl Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("relay_url", &self.config.relay_url)
            .finish_non_exhaustive()
    }
}

impl RelayClient {
    /// Create a new relay client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Get the configured relay URL.
    pub fn relay_url(&self) -> &str {
        &self.config.relay_url
    }

    /// Update the client configuration and recreate the client.
    pub fn update_config(
        &mut self,
        update: impl FnOnce(&mut CatalogClientConfig),
    ) -> Result<(), CatalogClientError> {
        let mut modified_config = self.config.clone();
        update(&mut modified_config);
        *self = Self::new(modified_config)?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.config.relay_url.trim_end_matches('/');
        if path.is_empty() {
            format!("{base}/{API_PREFIX}")
        } else {
            format!("{base}/{API_PREFIX}/{path}")
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CatalogClientError> {
        let response = request.send().await.map_relay_error().await?;
        response.json::<T>().await.map_err(CatalogClientError::Decode)
    }
}

impl ClientTrait for RelayClient {
    #[instrument(skip(self), fields(progress = "Fetching catalog page"))]
    async fn list(&self, offset: u32, limit: NonZeroU32) -> Result<ListPage, ListError> {
        debug!(offset, limit, "sending list request");
        let request = self
            .client
            .get(self.endpoint(""))
            .query(&[("offset", offset), ("limit", limit.get())]);
        let page: ListPage = self.get_json(request).await?;
        debug!(
            count = page.count,
            n_results = page.results.len(),
            has_next = page.has_next(),
            "received list page"
        );
        Ok(page)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn detail(&self, id: &ItemId) -> Result<CatalogItemDetail, DetailError> {
        let request = self.client.get(self.endpoint(&id.to_string()));
        self.get_json(request)
            .await
            .map_err(|err| DetailError::from_client_error(id, err))
    }

    #[instrument(skip_all)]
    async fn types(&self) -> Result<TypeList, TypesError> {
        let request = self.client.get(self.endpoint("types"));
        Ok(self.get_json(request).await?)
    }

    #[instrument(skip_all, fields(query = %query.as_ref()))]
    async fn search(
        &self,
        query: impl AsRef<str> + Send + Sync,
    ) -> Result<SearchResponse, SearchError> {
        let query = query.as_ref().trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let request = self
            .client
            .get(self.endpoint("search"))
            .query(&[("q", query)]);
        Ok(self.get_json(request).await?)
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build HTTP client with configured headers for the relay.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        relay_url = %config.relay_url,
        extra_headers = config.extra_headers.len(),
        "building relay HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("dex/{}", env!("CARGO_PKG_VERSION")));

    client_builder
        .user_agent(user_agent)
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
