use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{Instrument, info};

use crate::config::{Config, VirtualHosts};
use crate::http::connection::Connection;

/// Pause after a failed accept so persistent errors (e.g. fd exhaustion)
/// do not spin the loop.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub async fn run(cfg: &Config, hosts: VirtualHosts) -> anyhow::Result<()> {
    let hosts = Arc::new(hosts.validate().context("server is not set up correctly")?);
    if hosts.is_empty() {
        tracing::warn!("No virtual hosts configured, every request will get 404");
    } else {
        info!(count = hosts.len(), "Virtual hosts validated");
    }
    for (host, root) in hosts.hosts() {
        info!(host, root = %root.display(), "Serving virtual host");
    }

    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.listen_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, hosts, cfg).await
}

/// Accepts connections forever, one task per connection.
pub async fn serve(
    listener: TcpListener,
    hosts: Arc<VirtualHosts>,
    cfg: &Config,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        tracing::debug!("Accepted connection from {}", peer);

        let conn = Connection::new(socket, hosts.clone(), cfg.idle_timeout);
        tokio::spawn(
            async move {
                if let Err(e) = conn.run().await {
                    tracing::warn!("Connection error: {}", e);
                }
            }
            .instrument(tracing::info_span!("conn", %peer)),
        );
    }
}
