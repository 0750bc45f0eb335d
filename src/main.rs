//! Headline digest service: binary entrypoint.
//! Loads config, warms the cache with one full refresh, starts the hourly
//! refresh task, and serves the Axum router.

use headline_digest::{config::AppConfig, Services};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON with LOG_FORMAT=json.
/// Uses `try_init` so a subscriber installed by the host runtime wins.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("headline_digest=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load()?;
    let services = Services::from_config(config)?;

    // Initial cache population before serving.
    if let Err(e) = services.scheduler.refresh_once().await {
        tracing::error!(error = %format!("{e:#}"), "initial refresh failed; serving with fallback only");
    }
    let minute = services.config.schedule.minute;
    services.scheduler.clone().spawn();
    tracing::info!(minute, "background refresh scheduled at :{minute:02} of every hour");

    Ok(services.router().into())
}
