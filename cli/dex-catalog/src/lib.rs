//! Client side of the dex catalog.
//!
//! This crate provides:
//! - HTTP client construction for the relay in front of PokeAPI
//! - Common error handling and the error taxonomy shared with the front end
//! - An incremental [CatalogLoader] that pages through the catalog and
//!   enriches every entry with its detail record
//! - The pure filter/sort pipeline that derives the view shown to the user
//! - A [MockClient] that can be seeded with canned responses
//!
//! ## Usage
//!
//! ```ignore
//! use dex_catalog::{CatalogLoader, CatalogClientConfig, RelayClient, ViewFilterState};
//!
//! let client = RelayClient::new(CatalogClientConfig::new("http://127.0.0.1:3000"))?;
//! let loader = CatalogLoader::new(client, Default::default());
//! loader.load_initial().await;
//!
//! let entries = loader.entries();
//! let view = dex_catalog::derive_view(&entries, &ViewFilterState::default());
//! ```

mod client;
mod config;
mod error;
mod loader;
mod mock;
mod pipeline;
mod types;

#[cfg(any(test, feature = "tests"))]
pub mod test_helpers;

pub use client::{Client, ClientTrait, RelayClient};
pub use config::CatalogClientConfig;
pub use error::{
    CatalogClientError,
    DetailError,
    ErrorKind,
    ListError,
    MapRelayResponseExt,
    SearchError,
    TypesError,
};
pub use loader::{CatalogLoader, LoadOutcome, LoaderConfig, LoaderState};
pub use mock::{
    DEX_CATALOG_MOCK_DATA_VAR,
    GenericResponse,
    MockClient,
    MockData,
    MockDataError,
    MockRequest,
    Response,
};
pub use pipeline::{SortKey, UnknownSortKey, ViewFilterState, ViewSummary, derive_view};
pub use types::*;
