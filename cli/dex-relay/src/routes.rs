//! Request handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use dex_catalog::{ItemId, SearchMatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheLifetime, Cached};
use crate::error::RelayError;
use crate::state::RelayState;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 10_000;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    offset: Option<String>,
    limit: Option<String>,
}

impl ListParams {
    /// Returns `(offset, limit)` with defaults applied.
    fn validate(&self) -> Result<(u32, u32), RelayError> {
        let offset = match self.offset.as_deref() {
            None => 0,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| RelayError::InvalidPagination)?,
        };
        let limit = match self.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| RelayError::InvalidPagination)?,
        };
        if limit == 0 || limit > MAX_LIMIT {
            return Err(RelayError::InvalidPagination);
        }
        Ok((offset, limit))
    }
}

/// `GET /api/pokemon?offset&limit`
pub async fn list(
    State(state): State<RelayState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Cached<Value>, RelayError> {
    let Query(params) = params.map_err(|_| RelayError::InvalidPagination)?;
    let (offset, limit) = params.validate()?;

    let body = state
        .upstream
        .get_json("pokemon", &[
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ])
        .await
        .map_err(RelayError::List)?;
    Ok(Cached(CacheLifetime::Short, body))
}

/// `GET /api/pokemon/:id`
pub async fn detail(
    State(state): State<RelayState>,
    Path(id): Path<String>,
) -> Result<Cached<Value>, RelayError> {
    let id: ItemId = id.parse().map_err(|_| RelayError::InvalidId)?;

    match state.upstream.get_json(&format!("pokemon/{id}"), &[]).await {
        Ok(body) => Ok(Cached(CacheLifetime::Short, body)),
        Err(err) if err.is_not_found() => Err(RelayError::NotFound),
        Err(err) => Err(RelayError::Detail(err)),
    }
}

/// `GET /api/pokemon/types`
pub async fn types(State(state): State<RelayState>) -> Result<Cached<Value>, RelayError> {
    let body = state
        .upstream
        .get_json("type", &[])
        .await
        .map_err(RelayError::Types)?;
    Ok(Cached(CacheLifetime::Long, body))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchBody {
    results: Vec<Value>,
    #[serde(rename = "type")]
    match_type: SearchMatch,
}

/// `GET /api/pokemon/search?q=`
///
/// Only exact name or number matches are supported, anything else is an
/// empty partial result.
pub async fn search(
    State(state): State<RelayState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Cached<SearchBody>, RelayError> {
    let query = params
        .ok()
        .and_then(|Query(params)| params.q)
        .filter(|q| !q.trim().is_empty())
        .ok_or(RelayError::MissingQuery)?;

    let exact = match query.parse::<ItemId>() {
        Ok(id) => match state.upstream.get_json(&format!("pokemon/{id}"), &[]).await {
            Ok(body) => Some(body),
            Err(err) => {
                debug!(%query, error = %err, "no exact match");
                None
            },
        },
        Err(_) => None,
    };

    let body = match exact {
        Some(detail) => SearchBody {
            results: vec![detail],
            match_type: SearchMatch::Exact,
        },
        None => SearchBody {
            results: Vec::new(),
            match_type: SearchMatch::Partial,
        },
    };
    Ok(Cached(CacheLifetime::Short, body))
}

/// `GET /healthz`
pub async fn healthz() -> &'static str {
    "ok"
}
