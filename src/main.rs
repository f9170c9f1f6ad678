use anyhow::Context;
use vhostd::config::{Config, VirtualHosts};
use vhostd::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load();
    tracing::info!(
        listen = %cfg.listen_addr,
        vh_config = %cfg.vh_config.display(),
        docroot = %cfg.docroot_dir.display(),
        idle_timeout = ?cfg.idle_timeout,
        "Server config"
    );

    let docroot_dir = std::path::absolute(&cfg.docroot_dir)
        .with_context(|| format!("resolving {}", cfg.docroot_dir.display()))?;
    let hosts = VirtualHosts::load(&cfg.vh_config, &docroot_dir)?;

    tokio::select! {
        res = server::listener::run(&cfg, hosts) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
