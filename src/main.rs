//! Live feed viewer — binary entrypoint.
//! Spawns the feed session against `FEED_ENDPOINT_URL` and serves its
//! read/command API (plus `/metrics`) over HTTP.

use anyhow::Context;
use live_feed::config::{port_from_env, FeedConfig, DEFAULT_VIEWER_PORT};
use live_feed::link::WsConnector;
use live_feed::metrics::Metrics;
use live_feed::{create_router, spawn_session, telemetry, SessionLimits};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = FeedConfig::from_env()?;
    let port = port_from_env(DEFAULT_VIEWER_PORT)?;
    let metrics = Metrics::init()?;

    let (feed, session_task) =
        spawn_session(cfg.endpoint.clone(), WsConnector::new(), SessionLimits::default());

    let app = create_router(feed.clone()).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding viewer API on port {port}"))?;
    tracing::info!(port, endpoint = %cfg.endpoint, "viewer API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("viewer API server")?;

    feed.shutdown();
    if let Err(e) = session_task.await {
        tracing::warn!(error = %e, "feed session task ended abnormally");
    }
    Ok(())
}
