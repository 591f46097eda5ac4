// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use url::Url;

// --- env defaults & names ---
pub const ENV_FEED_ENDPOINT_URL: &str = "FEED_ENDPOINT_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_DEMO_INTERVAL_MS: &str = "DEMO_INTERVAL_MS";

/// Used only by debug builds when the endpoint env var is absent.
pub const DEV_DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";
pub const DEFAULT_VIEWER_PORT: u16 = 3000;
pub const DEFAULT_SOURCE_PORT: u16 = 8000;
pub const DEFAULT_DEMO_INTERVAL_MS: u64 = 3_000;

/// The single piece of runtime configuration the feed core consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub endpoint: Url,
}

impl FeedConfig {
    /// Reads `FEED_ENDPOINT_URL`. Release builds require it; debug builds fall
    /// back to the local demo source.
    pub fn from_env() -> Result<Self> {
        let raw = match std::env::var(ENV_FEED_ENDPOINT_URL) {
            Ok(v) if !v.trim().is_empty() => v,
            _ if cfg!(debug_assertions) => DEV_DEFAULT_ENDPOINT.to_string(),
            _ => bail!("{ENV_FEED_ENDPOINT_URL} must be set"),
        };
        Self::parse(&raw)
    }

    /// Accepts `ws://` and `wss://` URLs only.
    pub fn parse(raw: &str) -> Result<Self> {
        let endpoint = Url::parse(raw.trim())
            .with_context(|| format!("parsing feed endpoint `{}`", raw.trim()))?;
        match endpoint.scheme() {
            "ws" | "wss" => Ok(Self { endpoint }),
            other => Err(anyhow!("unsupported endpoint scheme `{other}`, expected ws or wss")),
        }
    }
}

/// `PORT` for whichever binary is starting, or its default.
pub fn port_from_env(default: u16) -> Result<u16> {
    match std::env::var(ENV_PORT) {
        Ok(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{ENV_PORT} is not a port number: `{v}`")),
        Err(_) => Ok(default),
    }
}

pub fn demo_interval_ms_from_env() -> u64 {
    std::env::var(ENV_DEMO_INTERVAL_MS)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_DEMO_INTERVAL_MS)
}
