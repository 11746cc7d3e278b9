//! Crypto news bot, binary entrypoint.
//! Boots the Axum HTTP surface (`/run`, `/stats`, ...) and the optional
//! in-process scheduler.

use crypto_news_bot::config::{BotConfig, BotRules};
use crypto_news_bot::metrics::Metrics;
use crypto_news_bot::{api, bootstrap, scheduler};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON lines with `LOG_FORMAT=json`.
/// Uses `try_init` so an already-installed subscriber (Shuttle's) wins quietly.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = BotConfig::from_env();
    let rules = BotRules::load_default();
    let metrics = Metrics::init(cfg.cooldown.as_secs());

    let state = bootstrap::build_state(&cfg, rules).await?;

    if let Some(every) = cfg.posting_interval {
        scheduler::spawn_cycle_scheduler(state.bot.clone(), every);
    } else {
        tracing::info!("POSTING_INTERVAL_MINUTES not set, cycles run only via /run");
    }

    tracing::info!(
        sources = ?cfg.news_sources,
        dry_run = cfg.dry_run,
        database = state.store.backend(),
        "crypto news bot ready"
    );

    let router = api::router(state).merge(metrics.router());
    Ok(router.into())
}
