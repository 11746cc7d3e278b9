//! Wiring: turns `BotConfig` + `BotRules` into a ready `CryptoBot`.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use crate::analyze::NewsFilter;
use crate::api::AppState;
use crate::bot::{BotDeps, CooldownPolicy, CryptoBot};
use crate::config::{BotConfig, BotRules};
use crate::generate::{ContentGenerator, DisabledGenerator, GeminiGenerator};
use crate::ingest::providers::{descriptor_for, RapidApiProvider};
use crate::ingest::types::NewsProvider;
use crate::ingest::Acquirer;
use crate::pacing::{Sleeper, TokioSleeper};
use crate::publish::{DryRunPublisher, Publisher, TwitterPublisher};
use crate::store::{JsonFileStore, PostStore, SupabaseStore};

/// Providers for `cfg.news_sources`, in order. Unknown ids are skipped.
pub fn build_providers(cfg: &BotConfig) -> Result<Vec<Arc<dyn NewsProvider>>> {
    let mut out: Vec<Arc<dyn NewsProvider>> = Vec::with_capacity(cfg.news_sources.len());
    for id in &cfg.news_sources {
        match descriptor_for(id) {
            Some(desc) => out.push(Arc::new(RapidApiProvider::new(
                desc,
                cfg.rapidapi_key.clone(),
                cfg.request_timeout,
            )?)),
            None => tracing::warn!(source = %id, "unknown news source, skipping"),
        }
    }
    if cfg.rapidapi_key.is_none() {
        tracing::warn!("RAPIDAPI_KEY not set; every news fetch will fail");
    }
    Ok(out)
}

pub async fn build_store(cfg: &BotConfig) -> Result<Arc<dyn PostStore>> {
    match &cfg.supabase {
        Some(sb) => {
            tracing::info!(table = %sb.table, "using supabase store");
            Ok(Arc::new(SupabaseStore::new(sb, cfg.request_timeout)?))
        }
        None => {
            tracing::info!(path = %cfg.store_path, "SUPABASE_URL/KEY not set, using file store");
            Ok(Arc::new(JsonFileStore::open(&cfg.store_path).await?))
        }
    }
}

pub fn build_generator(cfg: &BotConfig, rules: &BotRules) -> Result<Arc<dyn ContentGenerator>> {
    match &cfg.gemini_api_key {
        Some(key) => Ok(Arc::new(GeminiGenerator::new(
            key.clone(),
            cfg.gemini_model.clone(),
            cfg.request_timeout,
            rules.content.clone(),
        )?)),
        None => {
            tracing::warn!("GEMINI_API_KEY not set; content generation disabled");
            Ok(Arc::new(DisabledGenerator))
        }
    }
}

pub fn build_publisher(cfg: &BotConfig) -> Result<Arc<dyn Publisher>> {
    if cfg.dry_run {
        tracing::info!("DRY_RUN=1, posts will only be logged");
        return Ok(Arc::new(DryRunPublisher::default()));
    }
    if cfg.twitter.is_none() {
        tracing::warn!("TWITTER_API_KEY/SECRET or TWITTER_ACCESS_TOKEN/SECRET not set; publishing will fail");
    }
    Ok(Arc::new(TwitterPublisher::new(
        cfg.twitter.clone(),
        cfg.request_timeout,
    )?))
}

pub fn build_rng(cfg: &BotConfig) -> StdRng {
    match cfg.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

pub async fn build_bot(cfg: &BotConfig, rules: BotRules) -> Result<CryptoBot> {
    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let acquirer = Acquirer::new(build_providers(cfg)?, cfg.fallback_delay, sleeper.clone());

    let deps = BotDeps {
        acquirer,
        filter: NewsFilter::new(rules.scoring.clone()),
        generator: build_generator(cfg, &rules)?,
        publisher: build_publisher(cfg)?,
        store: build_store(cfg).await?,
        sleeper,
        content: rules.content,
    };
    let policy = CooldownPolicy {
        max_consecutive_failures: cfg.max_consecutive_failures,
        cooldown: cfg.cooldown,
    };
    Ok(CryptoBot::new(deps, policy, build_rng(cfg)))
}

pub async fn build_state(cfg: &BotConfig, rules: BotRules) -> Result<AppState> {
    Ok(AppState::new(build_bot(cfg, rules).await?))
}
