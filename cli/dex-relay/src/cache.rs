use std::time::Duration;

use axum::Json;
use axum::http::HeaderValue;
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// How long clients may cache a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLifetime {
    /// List, detail and search data
    Short,
    /// Near-static taxonomy data
    Long,
}

impl CacheLifetime {
    pub fn ttl(self) -> Duration {
        match self {
            CacheLifetime::Short => Duration::from_secs(60 * 60),
            CacheLifetime::Long => Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn header_value(self) -> HeaderValue {
        HeaderValue::from_str(&format!("public, max-age={}", self.ttl().as_secs()))
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
    }
}

/// A JSON body served with a `cache-control` header.
#[derive(Debug)]
pub struct Cached<T>(pub CacheLifetime, pub T);

impl<T: Serialize> IntoResponse for Cached<T> {
    fn into_response(self) -> Response {
        let Cached(lifetime, body) = self;
        let mut response = Json(body).into_response();
        response
            .headers_mut()
            .insert(CACHE_CONTROL, lifetime.header_value());
        response
    }
}
