// src/bot.rs
//! Cycle orchestrator: acquire -> select -> dedup -> generate -> publish -> record.
//!
//! One `CryptoBot` owns its `consecutive_failures` counter. Only an empty
//! acquisition (and an internal error) counts as a failure; no suitable news,
//! duplicates and generation/publish failures leave the counter alone. Once the
//! counter reaches the configured maximum on the acquisition path the bot
//! sleeps for the cooldown and starts counting from zero again.

use anyhow::Result;
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analyze::{select_best, NewsFilter};
use crate::config::ContentRules;
use crate::dedup::DedupGate;
use crate::generate::{polish_tweet, smart_hashtags, ContentGenerator, TweetStyle};
use crate::ingest::types::Fetched;
use crate::ingest::Acquirer;
use crate::pacing::Sleeper;
use crate::publish::Publisher;
use crate::store::{PostStore, PostedRecord, StoreHealth};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("bot_cycles_total", "Bot cycles by outcome.");
        describe_counter!("bot_cooldowns_total", "Cooldowns entered after repeated failures.");
        describe_gauge!(
            "bot_consecutive_failures",
            "Current consecutive acquisition failures."
        );
        describe_histogram!("bot_cycle_ms", "Cycle wall time in milliseconds.");
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoNews,
    NoSuitableNews,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    Generation,
    QualityCheck,
    Publish,
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostedSummary {
    pub post_id: String,
    pub title: String,
    pub source: String,
    pub content: String,
    pub score: f64,
    pub style: TweetStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Posted(PostedSummary),
    Skipped(SkipReason),
    Failed(FailReason),
}

impl CycleOutcome {
    /// `success` / `skipped` / `error`, as reported through `/run`.
    pub fn status(&self) -> &'static str {
        match self {
            CycleOutcome::Posted(_) => "success",
            CycleOutcome::Skipped(_) => "skipped",
            CycleOutcome::Failed(_) => "error",
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Posted(_) => "posted",
            CycleOutcome::Skipped(SkipReason::NoNews) => "no_news",
            CycleOutcome::Skipped(SkipReason::NoSuitableNews) => "no_suitable_news",
            CycleOutcome::Skipped(SkipReason::Duplicate) => "duplicate",
            CycleOutcome::Failed(FailReason::Generation) => "generation_failed",
            CycleOutcome::Failed(FailReason::QualityCheck) => "quality_check_failed",
            CycleOutcome::Failed(FailReason::Publish) => "publish_failed",
            CycleOutcome::Failed(FailReason::Internal(_)) => "internal_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CycleOutcome::Posted(p) => format!("posted news from {}", p.source),
            CycleOutcome::Skipped(SkipReason::NoNews) => "no news available from any source".into(),
            CycleOutcome::Skipped(SkipReason::NoSuitableNews) => {
                "no suitable news after filtering".into()
            }
            CycleOutcome::Skipped(SkipReason::Duplicate) => "news already posted".into(),
            CycleOutcome::Failed(FailReason::Generation) => "content generation failed".into(),
            CycleOutcome::Failed(FailReason::QualityCheck) => {
                "generated post failed quality check".into()
            }
            CycleOutcome::Failed(FailReason::Publish) => "publishing failed".into(),
            CycleOutcome::Failed(FailReason::Internal(e)) => format!("internal error: {e}"),
        }
    }

    pub fn is_posted(&self) -> bool {
        matches!(self, CycleOutcome::Posted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    pub max_consecutive_failures: u32,
    pub cooldown: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            cooldown: Duration::from_secs(300),
        }
    }
}

/// Collaborators of a bot instance.
pub struct BotDeps {
    pub acquirer: Acquirer,
    pub filter: NewsFilter,
    pub generator: Arc<dyn ContentGenerator>,
    pub publisher: Arc<dyn Publisher>,
    pub store: Arc<dyn PostStore>,
    pub sleeper: Arc<dyn Sleeper>,
    pub content: ContentRules,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderProbe {
    pub id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub publisher: &'static str,
    pub publisher_ok: bool,
    pub generator: &'static str,
    pub providers: Vec<ProviderProbe>,
    pub store: StoreHealth,
}

pub struct CryptoBot {
    acquirer: Acquirer,
    filter: NewsFilter,
    generator: Arc<dyn ContentGenerator>,
    publisher: Arc<dyn Publisher>,
    store: Arc<dyn PostStore>,
    sleeper: Arc<dyn Sleeper>,
    content: ContentRules,
    policy: CooldownPolicy,
    rng: StdRng,
    consecutive_failures: u32,
}

impl CryptoBot {
    pub fn new(deps: BotDeps, policy: CooldownPolicy, rng: StdRng) -> Self {
        ensure_metrics_described();
        Self {
            acquirer: deps.acquirer,
            filter: deps.filter,
            generator: deps.generator,
            publisher: deps.publisher,
            store: deps.store,
            sleeper: deps.sleeper,
            content: deps.content,
            policy,
            rng,
            consecutive_failures: 0,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn store(&self) -> &Arc<dyn PostStore> {
        &self.store
    }

    pub fn publisher(&self) -> &Arc<dyn Publisher> {
        &self.publisher
    }

    /// Run one full cycle. Never returns an error: internal failures become
    /// `Failed(Internal)` and count toward the failure counter.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();
        tracing::info!("starting bot cycle");

        let outcome = match self.try_cycle().await {
            Ok(o) => o,
            Err(e) => {
                self.consecutive_failures += 1;
                tracing::error!(
                    error = ?e,
                    consecutive_failures = self.consecutive_failures,
                    "bot cycle failed"
                );
                CycleOutcome::Failed(FailReason::Internal(format!("{e:#}")))
            }
        };

        counter!("bot_cycles_total", "outcome" => outcome.label()).increment(1);
        gauge!("bot_consecutive_failures").set(f64::from(self.consecutive_failures));
        histogram!("bot_cycle_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(
            outcome = outcome.label(),
            consecutive_failures = self.consecutive_failures,
            "bot cycle finished"
        );
        outcome
    }

    async fn try_cycle(&mut self) -> Result<CycleOutcome> {
        // ACQUIRE
        let raw = self.acquirer.acquire(&mut self.rng).await;
        if raw.is_empty() {
            self.on_acquire_failure().await;
            return Ok(CycleOutcome::Skipped(SkipReason::NoNews));
        }
        let fetched = raw.len();

        // SELECT
        let Some(best) = select_best(&self.filter, raw) else {
            tracing::info!(fetched, "no suitable news after filtering");
            return Ok(CycleOutcome::Skipped(SkipReason::NoSuitableNews));
        };
        let score = best.quality_score.unwrap_or(0.0);
        tracing::info!(
            title = %best.title.chars().take(50).collect::<String>(),
            source = %best.source,
            score,
            "selected news"
        );

        // DEDUP_CHECK
        if DedupGate::new(self.store.as_ref())
            .is_duplicate(&best.title)
            .await?
        {
            return Ok(CycleOutcome::Skipped(SkipReason::Duplicate));
        }

        // GENERATE
        let style = TweetStyle::random(&mut self.rng);
        let hashtags = smart_hashtags(&best, &self.content);
        let raw_text = match self.generator.generate(&best, style, &hashtags).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    generator = self.generator.provider_name(),
                    "content generation failed"
                );
                return Ok(CycleOutcome::Failed(FailReason::Generation));
            }
        };
        let Some(text) = polish_tweet(&raw_text, &self.content) else {
            return Ok(CycleOutcome::Failed(FailReason::QualityCheck));
        };

        // PUBLISH
        let receipt = match self.publisher.publish(&text).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = ?e, publisher = self.publisher.name(), "publishing failed");
                return Ok(CycleOutcome::Failed(FailReason::Publish));
            }
        };

        // RECORD: the post is out, so the counter resets whatever the write does.
        self.consecutive_failures = 0;
        let record = PostedRecord {
            title: best.title.clone(),
            url: best.url.clone(),
            content: text.clone(),
            source: best.source.clone(),
            posted_at: Utc::now(),
        };
        if let Err(e) = self.store.insert_posted(&record).await {
            tracing::error!(
                error = ?e,
                backend = self.store.backend(),
                post_id = %receipt.post_id,
                "failed to record posted news"
            );
        }

        Ok(CycleOutcome::Posted(PostedSummary {
            post_id: receipt.post_id,
            title: best.title,
            source: best.source,
            content: text,
            score,
            style,
        }))
    }

    async fn on_acquire_failure(&mut self) {
        self.consecutive_failures += 1;
        tracing::warn!(
            consecutive_failures = self.consecutive_failures,
            "no news from any source"
        );
        if self.consecutive_failures >= self.policy.max_consecutive_failures {
            tracing::warn!(
                cooldown_secs = self.policy.cooldown.as_secs(),
                "too many consecutive failures, cooling down"
            );
            counter!("bot_cooldowns_total").increment(1);
            self.sleeper.sleep(self.policy.cooldown).await;
            self.consecutive_failures = 0;
        }
    }

    /// Probe every collaborator once. Does not touch the failure counter.
    pub async fn probe_services(&self) -> ServiceReport {
        let publisher_ok = self.publisher.verify_credentials().await;

        let mut providers = Vec::with_capacity(self.acquirer.providers().len());
        for p in self.acquirer.providers() {
            let probe = match p.fetch_batch().await {
                Fetched::Batch(items) if !items.is_empty() => ProviderProbe {
                    id: p.id().to_string(),
                    status: "working",
                    items: Some(items.len()),
                    error: None,
                },
                Fetched::Batch(_) | Fetched::Empty => ProviderProbe {
                    id: p.id().to_string(),
                    status: "empty",
                    items: Some(0),
                    error: None,
                },
                Fetched::Transient(e) | Fetched::Fatal(e) => ProviderProbe {
                    id: p.id().to_string(),
                    status: "error",
                    items: None,
                    error: Some(e),
                },
            };
            providers.push(probe);
        }

        ServiceReport {
            publisher: self.publisher.name(),
            publisher_ok,
            generator: self.generator.provider_name(),
            providers,
            store: self.store.health().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_status_mapping() {
        assert_eq!(
            CycleOutcome::Skipped(SkipReason::Duplicate).status(),
            "skipped"
        );
        assert_eq!(CycleOutcome::Skipped(SkipReason::NoNews).status(), "skipped");
        assert_eq!(CycleOutcome::Failed(FailReason::Publish).status(), "error");
        assert_eq!(
            CycleOutcome::Failed(FailReason::Internal("x".into())).label(),
            "internal_error"
        );
    }

    #[test]
    fn default_policy() {
        let p = CooldownPolicy::default();
        assert_eq!(p.max_consecutive_failures, 5);
        assert_eq!(p.cooldown, Duration::from_secs(300));
    }
}
