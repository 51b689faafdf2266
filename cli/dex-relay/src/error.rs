//! Relay error types and the normalized error envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dex_catalog::ErrorEnvelope;
use tracing::{error, warn};

use crate::upstream::UpstreamError;

/// Relay error type.
///
/// The display text is the message sent to clients.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid pagination parameters")]
    InvalidPagination,
    #[error("Invalid Pokemon ID")]
    InvalidId,
    #[error("Search query is required")]
    MissingQuery,
    #[error("Pokemon not found")]
    NotFound,
    #[error("not found: {path}")]
    UnknownRoute { path: String },
    #[error("Failed to fetch Pokemon list")]
    List(#[source] UpstreamError),
    #[error("Failed to fetch Pokemon")]
    Detail(#[source] UpstreamError),
    #[error("Failed to fetch Pokemon types")]
    Types(#[source] UpstreamError),
    #[error("Request timed out")]
    Timeout,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPagination | Self::InvalidId | Self::MissingQuery => {
                StatusCode::BAD_REQUEST
            },
            Self::NotFound | Self::UnknownRoute { .. } => StatusCode::NOT_FOUND,
            Self::List(_) | Self::Detail(_) | Self::Types(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::List(source) | Self::Detail(source) | Self::Types(source) => {
                error!(%status, error = %self, %source, "upstream request failed");
            },
            _ if status.is_server_error() => warn!(%status, error = %self, "request failed"),
            _ => {},
        }
        let envelope = ErrorEnvelope {
            error: self.to_string(),
        };
        (status, Json(envelope)).into_response()
    }
}
