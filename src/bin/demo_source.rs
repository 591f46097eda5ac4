//! Demo event source: serves `/ws` and pushes a random feed event every
//! `DEMO_INTERVAL_MS` (default 3000) to each connected client.

use std::time::Duration;

use anyhow::Context;
use live_feed::config::{demo_interval_ms_from_env, port_from_env, DEFAULT_SOURCE_PORT};
use live_feed::source::{self, SourceConfig};
use live_feed::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let port = port_from_env(DEFAULT_SOURCE_PORT)?;
    let cfg = SourceConfig {
        interval: Duration::from_millis(demo_interval_ms_from_env()),
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding demo source on port {port}"))?;
    tracing::info!(port, interval_ms = cfg.interval.as_millis() as u64, "demo source listening on /ws");

    source::serve(listener, cfg).await.context("demo source server")
}
