use std::net::SocketAddr;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use dex_relay::RelayState;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::utils::message;

/// Run the relay in front of PokeAPI
#[derive(Debug, Bpaf, Clone)]
pub struct Serve {
    /// Address to listen on (default: 'bind_address' from the config)
    #[bpaf(long, argument("ADDR"))]
    pub bind: Option<SocketAddr>,
}

impl Serve {
    #[instrument(name = "serve", skip_all)]
    pub async fn handle(self, config: Config) -> Result<()> {
        let relay_config = config.relay_config();
        let upstream_url = relay_config.upstream_url.clone();
        let state = RelayState::new(relay_config)
            .with_context(|| format!("could not create relay for upstream '{upstream_url}'"))?;

        let bind = self.bind.unwrap_or(config.bind_address);
        let listener = TcpListener::bind(bind)
            .await
            .with_context(|| format!("could not listen on {bind}"))?;
        let local_addr = listener.local_addr().unwrap_or(bind);

        message::plain(format!(
            "Relay listening on http://{local_addr}, forwarding to {upstream_url}"
        ));

        dex_relay::serve(listener, state, wait_for_shutdown_signal())
            .await
            .context("relay stopped unexpectedly")?;

        info!("relay shut down");
        Ok(())
    }
}

/// Resolves on the first interrupt, or immediately if signals cannot be observed.
async fn wait_for_shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "could not listen for interrupts, shutting down");
        return;
    }
    info!("interrupted, shutting down relay");
}
