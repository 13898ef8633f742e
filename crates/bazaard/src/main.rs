//! bazaard — the storefront daemon.
//!
//! Wires the serving substrate together: config, session pool,
//! housekeeping, the middleware chain, and the listener.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;

use bazaar_core::config::BazaarConfig;
use bazaar_core::{SharedClock, SystemClock};
use bazaar_http::middlewares::{AccessLogger, DateHeader, Failsafe, ServerHeader};
use bazaar_http::{App, HouseKeeping, Server, SessionPool, SessionTracker};

mod storefront;

use storefront::Storefront;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config. An optional first argument overrides the file path.
    if let Err(e) = BazaarConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config_arg = std::env::args().nth(1).map(PathBuf::from);
    let config = BazaarConfig::load_from(config_arg.as_deref()).context("loading config")?;
    // Bad config is fatal before the listener binds, never after.
    config.validate().context("invalid configuration")?;

    let clock: SharedClock = Arc::new(SystemClock);

    let pool = Arc::new(SessionPool::new(config.session_timeout(), clock.clone()));
    let housekeeping = HouseKeeping::new(
        pool.clone(),
        config.housekeeping_period(),
        clock.clone(),
    );
    housekeeping.start();
    tracing::info!(
        timeout_secs = config.session.timeout_secs,
        period_secs = config.session.housekeeping_period_secs,
        "session pool ready"
    );

    let app = Arc::new(
        App::new(Arc::new(Storefront::new(config.server.encoding.clone())))
            .wrap(Arc::new(AccessLogger::new(clock.clone())))
            .wrap(Arc::new(DateHeader::new(clock.clone())))
            .wrap(Arc::new(ServerHeader::new("bazaar")))
            .wrap(Arc::new(SessionTracker::new(
                pool.clone(),
                config.session.cookie_name.clone(),
            )))
            // Innermost boundary: the tracker above still sees a response
            // (and writes its cookie) when the storefront faults.
            .wrap(Arc::new(Failsafe)),
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(true);
        });
    }

    let server = Server::bind(("0.0.0.0", config.server.port))
        .await
        .with_context(|| format!("binding port {}", config.server.port))?;
    tracing::info!(port = config.server.port, "storefront listening");

    server.run(app, shutdown_rx).await?;

    housekeeping.stop();
    tracing::info!("bazaard stopped");
    Ok(())
}
