//! Error handling for relay operations.

use derive_more::Display;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::types::{ErrorEnvelope, InvalidItemId, ItemId};

/// Coarse classification of failures, used by the loader and front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// A malformed identifier or query parameter.
    #[display("invalid input")]
    InvalidInput,
    /// The remote reported that the item does not exist.
    #[display("not found")]
    NotFound,
    /// Network failure or any non-2xx response other than 404.
    #[display("transport failure")]
    TransportFailure,
    /// An individual detail fetch failed while enriching a page.
    #[display("partial enrichment failure")]
    PartialEnrichmentFailure,
}

/// Common error type for relay operations.
///
/// Operation specific errors ([ListError], [DetailError], ...) wrap this type.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("failed to reach the catalog relay")]
    Request(#[source] reqwest::Error),
    #[error("catalog relay responded with {status}: {message}")]
    UnexpectedStatus { status: StatusCode, message: String },
    #[error("failed to decode catalog relay response")]
    Decode(#[source] reqwest::Error),
    #[error("{}", .0)]
    Other(String),
}

impl CatalogClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::UnexpectedStatus { status, .. } => Some(*status),
            CatalogClientError::Request(err) | CatalogClientError::Decode(err) => err.status(),
            CatalogClientError::Other(_) => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.status() {
            Some(StatusCode::NOT_FOUND) => ErrorKind::NotFound,
            Some(StatusCode::BAD_REQUEST) => ErrorKind::InvalidInput,
            _ => ErrorKind::TransportFailure,
        }
    }
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error("failed to fetch catalog list")]
    CatalogClientError(#[from] CatalogClientError),
}

impl ListError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ListError::CatalogClientError(err) => err.kind(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("invalid identifier")]
    InvalidInput(#[from] InvalidItemId),
    #[error("'{0}' not found in catalog")]
    NotFound(ItemId),
    #[error("failed to fetch '{id}'")]
    Transport {
        id: ItemId,
        #[source]
        source: CatalogClientError,
    },
}

impl DetailError {
    /// Classify a relay failure for `id`, splitting out 400 and 404 responses.
    pub fn from_client_error(id: &ItemId, err: CatalogClientError) -> Self {
        match err.status() {
            Some(StatusCode::NOT_FOUND) => DetailError::NotFound(id.clone()),
            Some(StatusCode::BAD_REQUEST) => {
                DetailError::InvalidInput(InvalidItemId::InvalidCharacters(id.to_string()))
            },
            _ => DetailError::Transport {
                id: id.clone(),
                source: err,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DetailError::InvalidInput(_) => ErrorKind::InvalidInput,
            DetailError::NotFound(_) => ErrorKind::NotFound,
            DetailError::Transport { .. } => ErrorKind::TransportFailure,
        }
    }
}

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("failed to fetch category tags")]
    CatalogClientError(#[from] CatalogClientError),
}

impl TypesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TypesError::CatalogClientError(err) => err.kind(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query is required")]
    EmptyQuery,
    #[error("search failed")]
    CatalogClientError(#[from] CatalogClientError),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::EmptyQuery => ErrorKind::InvalidInput,
            SearchError::CatalogClientError(err) => err.kind(),
        }
    }
}

/// Extension trait for turning relay responses into client errors.
pub trait MapRelayResponseExt {
    /// Consumes a `Result<reqwest::Response, reqwest::Error>` and returns the
    /// response if it has a success status.
    ///
    /// Transport errors and non-2xx responses are mapped into
    /// [CatalogClientError], using the relay's error envelope as the message
    /// when the body can be parsed.
    fn map_relay_error(
        self,
    ) -> impl std::future::Future<Output = Result<reqwest::Response, CatalogClientError>> + Send;
}

impl MapRelayResponseExt for Result<reqwest::Response, reqwest::Error> {
    async fn map_relay_error(self) -> Result<reqwest::Response, CatalogClientError> {
        let response = self.map_err(CatalogClientError::Request)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // The body may be HTML garbage from a proxy in front of the relay,
        // only use it if it is the relay's own envelope.
        let message = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("response body omitted")
                .to_string(),
        };
        Err(CatalogClientError::UnexpectedStatus { status, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode) -> CatalogClientError {
        CatalogClientError::UnexpectedStatus {
            status,
            message: "nope".to_string(),
        }
    }

    #[test]
    fn client_error_kinds_follow_status() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR).kind(),
            ErrorKind::TransportFailure
        );
        assert_eq!(
            CatalogClientError::Other("connection reset".into()).kind(),
            ErrorKind::TransportFailure
        );
    }

    #[test]
    fn detail_errors_split_not_found() {
        let id = ItemId::Name("missingno".into());
        let err = DetailError::from_client_error(&id, status_error(StatusCode::NOT_FOUND));
        assert!(matches!(err, DetailError::NotFound(ref i) if i == &id));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = DetailError::from_client_error(&id, status_error(StatusCode::BAD_GATEWAY));
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }
}
