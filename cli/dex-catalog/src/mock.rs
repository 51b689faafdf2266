//! A client that answers from canned data instead of talking to the relay.
//!
//! Used by the loader tests and, through [DEX_CATALOG_MOCK_DATA_VAR], by the
//! binary's integration tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Notify;

use crate::client::ClientTrait;
use crate::error::{CatalogClientError, DetailError, ListError, SearchError, TypesError};
use crate::types::*;

/// Path to a JSON file with [MockData], when set the binary uses a [MockClient].
pub const DEX_CATALOG_MOCK_DATA_VAR: &str = "_DEX_USE_CATALOG_MOCK";

// Arc allows you to push things into the client from outside the client if necessary
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// An error response as the relay would send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericResponse {
    pub status: u16,
    pub error: String,
}

impl GenericResponse {
    pub fn new(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    fn into_client_error(self) -> CatalogClientError {
        match StatusCode::from_u16(self.status) {
            Ok(status) => CatalogClientError::UnexpectedStatus {
                status,
                message: self.error,
            },
            Err(_) => CatalogClientError::Other(self.error),
        }
    }
}

/// Either a successful body or an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response<T> {
    Error(GenericResponse),
    Ok(T),
}

/// Contents of a mock data file.
///
/// List requests are answered from `list_responses` first and then by
/// slicing `catalog`, detail requests are looked up by name in `details`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MockData {
    #[serde(default)]
    pub catalog: Vec<NamedResource>,
    #[serde(default)]
    pub list_responses: VecDeque<Response<ListPage>>,
    #[serde(default)]
    pub details: BTreeMap<String, Response<CatalogItemDetail>>,
    #[serde(default)]
    pub types: Option<Response<TypeList>>,
}

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file pointed at by the _DEX_USE_CATALOG_MOCK var
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// A request the mock client has answered, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRequest {
    List { offset: u32, limit: u32 },
    Detail(String),
    Types,
    Search(String),
}

/// A catalog client that can be seeded with mock responses
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_data: MockField<MockData>,
    /// Number of scheduler yields before a detail answer, keyed by name.
    detail_yields: MockField<HashMap<String, usize>>,
    /// When set, list requests wait for a notification before answering.
    list_gate: MockField<Option<Arc<Notify>>>,
    requests: MockField<Vec<MockRequest>>,
}

/// Reads mock data from disk.
fn read_mock_data(path: impl AsRef<Path>) -> Result<MockData, MockDataError> {
    let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
    serde_json::from_str(&contents).map_err(MockDataError::ParseJson)
}

impl MockClient {
    /// Create a new mock client, potentially reading mock data from disk
    pub fn new(mock_data_path: Option<impl AsRef<Path>>) -> Result<Self, MockDataError> {
        let mock_data = match mock_data_path {
            Some(path) => read_mock_data(path)?,
            None => MockData::default(),
        };
        Ok(Self::from_data(mock_data))
    }

    pub fn from_data(mock_data: MockData) -> Self {
        Self {
            mock_data: Arc::new(Mutex::new(mock_data)),
            ..Default::default()
        }
    }

    /// Append resources to the catalog served by list requests.
    pub fn extend_catalog(&self, resources: impl IntoIterator<Item = NamedResource>) {
        self.mock_data
            .lock()
            .expect("couldn't acquire mock lock")
            .catalog
            .extend(resources);
    }

    /// Push a list response that takes precedence over the seeded catalog.
    pub fn push_list_response(&self, resp: Response<ListPage>) {
        self.mock_data
            .lock()
            .expect("couldn't acquire mock lock")
            .list_responses
            .push_back(resp);
    }

    /// Push a list failure with the given status.
    pub fn push_list_error(&self, status: u16) {
        self.push_list_response(Response::Error(GenericResponse::new(
            status,
            "Failed to fetch Pokemon list",
        )));
    }

    pub fn insert_detail(&self, detail: CatalogItemDetail) {
        self.mock_data
            .lock()
            .expect("couldn't acquire mock lock")
            .details
            .insert(detail.name.clone(), Response::Ok(detail));
    }

    /// Make detail requests for `name` fail with `status`.
    pub fn insert_detail_error(&self, name: impl Into<String>, status: u16) {
        self.mock_data
            .lock()
            .expect("couldn't acquire mock lock")
            .details
            .insert(
                name.into(),
                Response::Error(GenericResponse::new(status, "Failed to fetch Pokemon")),
            );
    }

    pub fn set_types(&self, types: TypeList) {
        self.mock_data
            .lock()
            .expect("couldn't acquire mock lock")
            .types = Some(Response::Ok(types));
    }

    /// Delay the detail answer for `name` by `yields` trips through the scheduler.
    pub fn delay_detail(&self, name: impl Into<String>, yields: usize) {
        self.detail_yields
            .lock()
            .expect("couldn't acquire mock lock")
            .insert(name.into(), yields);
    }

    /// Hold list requests until the returned handle is notified.
    pub fn gate_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().expect("couldn't acquire mock lock") = Some(gate.clone());
        gate
    }

    /// The requests answered so far.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }

    /// Number of detail requests answered for `name`.
    pub fn detail_requests(&self, name: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| matches!(request, MockRequest::Detail(n) if n == name))
            .count()
    }

    fn record(&self, request: MockRequest) {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(request);
    }

    fn page_from_catalog(data: &MockData, offset: u32, limit: NonZeroU32) -> ListPage {
        let start = (offset as usize).min(data.catalog.len());
        let end = start.saturating_add(limit.get() as usize).min(data.catalog.len());
        let next = (end < data.catalog.len())
            .then(|| format!("/api/pokemon?offset={end}&limit={limit}"));
        let previous = (start > 0).then(|| {
            format!(
                "/api/pokemon?offset={}&limit={limit}",
                start.saturating_sub(limit.get() as usize)
            )
        });
        ListPage {
            count: data.catalog.len() as u64,
            next,
            previous,
            results: data.catalog[start..end].to_vec(),
        }
    }

    fn lookup_detail(&self, id: &ItemId) -> Option<Response<CatalogItemDetail>> {
        let data = self.mock_data.lock().expect("couldn't acquire mock lock");
        match id {
            ItemId::Name(name) => data.details.get(name).cloned(),
            ItemId::Number(number) => data
                .details
                .values()
                .find(|resp| matches!(resp, Response::Ok(d) if d.id == number.get()))
                .cloned(),
        }
    }
}

impl ClientTrait for MockClient {
    async fn list(&self, offset: u32, limit: NonZeroU32) -> Result<ListPage, ListError> {
        self.record(MockRequest::List {
            offset,
            limit: limit.get(),
        });

        let gate = self
            .list_gate
            .lock()
            .expect("couldn't acquire mock lock")
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut data = self.mock_data.lock().expect("couldn't acquire mock lock");
        match data.list_responses.pop_front() {
            Some(Response::Ok(page)) => Ok(page),
            Some(Response::Error(err)) => Err(err.into_client_error().into()),
            None => Ok(Self::page_from_catalog(&data, offset, limit)),
        }
    }

    async fn detail(&self, id: &ItemId) -> Result<CatalogItemDetail, DetailError> {
        self.record(MockRequest::Detail(id.to_string()));

        let yields = self
            .detail_yields
            .lock()
            .expect("couldn't acquire mock lock")
            .get(&id.to_string())
            .copied()
            .unwrap_or_default();
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }

        match self.lookup_detail(id) {
            Some(Response::Ok(detail)) => Ok(detail),
            Some(Response::Error(err)) => {
                Err(DetailError::from_client_error(id, err.into_client_error()))
            },
            None => Err(DetailError::NotFound(id.clone())),
        }
    }

    async fn types(&self) -> Result<TypeList, TypesError> {
        self.record(MockRequest::Types);
        let data = self.mock_data.lock().expect("couldn't acquire mock lock");
        match data.types.clone() {
            Some(Response::Ok(types)) => Ok(types),
            Some(Response::Error(err)) => Err(err.into_client_error().into()),
            None => Ok(TypeList {
                count: 0,
                next: None,
                previous: None,
                results: Vec::new(),
            }),
        }
    }

    async fn search(
        &self,
        query: impl AsRef<str> + Send + Sync,
    ) -> Result<SearchResponse, SearchError> {
        let query = query.as_ref().trim().to_lowercase();
        self.record(MockRequest::Search(query.clone()));
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let exact = match query.parse::<ItemId>() {
            Ok(id) => match self.lookup_detail(&id) {
                Some(Response::Ok(detail)) => Some(detail),
                _ => None,
            },
            Err(_) => None,
        };
        Ok(match exact {
            Some(detail) => SearchResponse {
                results: vec![detail],
                match_type: SearchMatch::Exact,
            },
            None => SearchResponse {
                results: Vec::new(),
                match_type: SearchMatch::Partial,
            },
        })
    }
}
