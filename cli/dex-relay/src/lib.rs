//! HTTP relay in front of PokeAPI.
//!
//! The relay validates path and query parameters, forwards requests to the
//! upstream API, normalizes failures into a `{ "error": ... }` envelope and
//! annotates successful responses with a cache lifetime.

mod cache;
mod error;
mod router;
mod routes;
mod state;
mod upstream;

use std::future::Future;

use tokio::net::TcpListener;
use tracing::info;

pub use cache::{CacheLifetime, Cached};
pub use error::RelayError;
pub use router::relay_router;
pub use state::{DEFAULT_UPSTREAM_URL, RelayConfig, RelayState};
pub use upstream::{Upstream, UpstreamError};

/// Serve the relay on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: RelayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, upstream = %state.upstream.base_url(), "relay listening");
    }
    axum::serve(listener, relay_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
