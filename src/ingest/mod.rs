// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{Candidate, Fetched, NewsProvider};
use crate::pacing::Sleeper;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "news_candidates_total",
            "Complete news items returned by providers."
        );
        describe_counter!(
            "news_provider_errors_total",
            "Provider fetches that returned no batch."
        );
        describe_histogram!("news_fetch_ms", "Provider fetch time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace (includes NBSP)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 4) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Obtains one batch of raw candidates: a random provider first, then every
/// provider in declared order until one yields a non-empty batch.
pub struct Acquirer {
    providers: Vec<Arc<dyn NewsProvider>>,
    retry_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl Acquirer {
    pub fn new(
        providers: Vec<Arc<dyn NewsProvider>>,
        retry_delay: Duration,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            providers,
            retry_delay,
            sleeper,
        }
    }

    pub fn providers(&self) -> &[Arc<dyn NewsProvider>] {
        &self.providers
    }

    /// Pick the first provider uniformly at random, then fall back.
    pub async fn acquire<R: Rng + Send>(&self, rng: &mut R) -> Vec<Candidate> {
        if self.providers.is_empty() {
            tracing::error!("no news providers configured");
            return Vec::new();
        }
        let first = rng.random_range(0..self.providers.len());
        self.acquire_from(first).await
    }

    /// Same as `acquire` with the first pick fixed to `first` (index into providers).
    /// An out-of-range index goes straight to the fallback pass.
    pub async fn acquire_from(&self, first: usize) -> Vec<Candidate> {
        if let Some(p) = self.providers.get(first) {
            tracing::info!(provider = p.id(), "selected news source");
            if let Some(batch) = self.try_provider(p.as_ref()).await {
                return batch;
            }
        }

        // Fallback: full list in declared order (the first pick included).
        let last = self.providers.len().saturating_sub(1);
        for (i, p) in self.providers.iter().enumerate() {
            tracing::info!(provider = p.id(), "trying fallback source");
            if let Some(batch) = self.try_provider(p.as_ref()).await {
                return batch;
            }
            if i < last {
                self.sleeper.sleep(self.retry_delay).await;
            }
        }

        tracing::warn!("all news sources failed");
        Vec::new()
    }

    async fn try_provider(&self, p: &dyn NewsProvider) -> Option<Vec<Candidate>> {
        let fetched = p.fetch_batch().await;
        match &fetched {
            Fetched::Batch(v) if !v.is_empty() => {}
            Fetched::Transient(reason) | Fetched::Fatal(reason) => {
                tracing::warn!(provider = p.id(), kind = fetched.label(), %reason, "provider error");
                counter!("news_provider_errors_total", "kind" => fetched.label()).increment(1);
            }
            _ => {
                tracing::info!(provider = p.id(), "provider returned no items");
                counter!("news_provider_errors_total", "kind" => "empty").increment(1);
            }
        }
        fetched.into_batch()
    }
}
