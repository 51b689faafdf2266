//! Relay router setup.

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::OriginalUri;
use axum::routing::get;
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::RelayError;
use crate::routes;
use crate::state::RelayState;

/// Creates the relay router.
pub fn relay_router(state: RelayState) -> Router {
    let request_timeout = state.config.request_timeout;
    let concurrency_limit = state.config.concurrency_limit;

    let router = Router::new()
        .route("/api/pokemon", get(routes::list))
        .route("/api/pokemon/types", get(routes::types))
        .route("/api/pokemon/search", get(routes::search))
        .route("/api/pokemon/:id", get(routes::detail))
        .route("/healthz", get(routes::healthz))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http());

    // One semaphore shared by every route
    let router = match concurrency_limit {
        Some(limit) => router.layer(GlobalConcurrencyLimitLayer::new(limit)),
        None => router,
    };

    let router = match request_timeout {
        Some(timeout) => router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(timeout)),
        ),
        None => router,
    };

    router.with_state(state)
}

async fn not_found(uri: OriginalUri) -> RelayError {
    RelayError::UnknownRoute {
        path: uri.0.path().to_string(),
    }
}

async fn handle_timeout_error(_err: tower::BoxError) -> RelayError {
    RelayError::Timeout
}
