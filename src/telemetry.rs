// src/telemetry.rs
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
const DEFAULT_FILTER: &str = "live_feed=info,warn";

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `LOG_FORMAT=json` switches to JSON lines. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
