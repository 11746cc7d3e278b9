// tests/common/mod.rs
// Shared stubs for integration tests: scripted providers, generator,
// publisher and a store wrapper that can be told to fail.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crypto_news_bot::analyze::NewsFilter;
use crypto_news_bot::bot::{BotDeps, CooldownPolicy, CryptoBot};
use crypto_news_bot::config::ContentRules;
use crypto_news_bot::generate::{ContentGenerator, TweetStyle};
use crypto_news_bot::ingest::types::{Candidate, Fetched, NewsProvider};
use crypto_news_bot::ingest::Acquirer;
use crypto_news_bot::pacing::Sleeper;
use crypto_news_bot::publish::{PublishReceipt, Publisher};
use crypto_news_bot::store::{JsonFileStore, PostStore, PostedRecord, StoreHealth};

pub const RETRY_DELAY: Duration = Duration::from_millis(7);
pub const COOLDOWN: Duration = Duration::from_secs(300);

/// Passes the default quality gate (length, hashtag, no AI phrases).
pub const GOOD_POST: &str = "Bitcoin ETF approval lands and spot flows are the thing to watch this week. Liquidity is moving back on chain. #Bitcoin #Crypto";

pub fn news(title: &str, description: &str, source: &str) -> Candidate {
    Candidate {
        title: title.into(),
        description: description.into(),
        url: "http://x".into(),
        source: source.into(),
        ..Default::default()
    }
}

/// The reference scenario item: bitcoin + regulation, title over 30 chars,
/// description over 100 chars, reliable source. Scores 17.0.
pub fn etf_news() -> Candidate {
    news(
        "Bitcoin ETF Approved by Regulator",
        "A long description mentioning bitcoin and regulation extensively, written to run past one hundred characters in total.",
        "coingecko",
    )
}

/// Returns immediately and remembers every requested duration.
#[derive(Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of sleeps of exactly `dur`.
    pub fn count_of(&self, dur: Duration) -> usize {
        self.calls().iter().filter(|d| **d == dur).count()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, dur: Duration) {
        self.calls.lock().unwrap().push(dur);
    }
}

/// Provider that plays `script` front to back, then repeats `reply` forever.
pub struct StubProvider {
    id: String,
    script: Mutex<VecDeque<Fetched>>,
    reply: Fetched,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(id: &str, reply: Fetched) -> Arc<Self> {
        Self::scripted(id, vec![], reply)
    }

    pub fn scripted(id: &str, script: Vec<Fetched>, then: Fetched) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            script: Mutex::new(script.into()),
            reply: then,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn batch(id: &str, items: Vec<Candidate>) -> Arc<Self> {
        Self::new(id, Fetched::Batch(items))
    }

    pub fn empty(id: &str) -> Arc<Self> {
        Self::new(id, Fetched::Empty)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsProvider for StubProvider {
    async fn fetch_batch(&self) -> Fetched {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.reply.clone())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct StubGenerator {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl StubGenerator {
    pub fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err("model unavailable".into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(&self, _: &Candidate, _: TweetStyle, _: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(|e| anyhow!(e))
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

#[derive(Default)]
pub struct StubPublisher {
    fail: bool,
    pub published: Mutex<Vec<String>>,
}

impl StubPublisher {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&self, text: &str) -> Result<PublishReceipt> {
        if self.fail {
            return Err(anyhow!("x api returned 403"));
        }
        let mut g = self.published.lock().unwrap();
        g.push(text.to_string());
        Ok(PublishReceipt {
            post_id: format!("stub-{}", g.len()),
        })
    }

    async fn verify_credentials(&self) -> bool {
        !self.fail
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// In-memory store whose lookups and writes can be switched to fail.
pub struct FlakyStore {
    inner: JsonFileStore,
    pub fail_lookup: AtomicBool,
    pub fail_insert: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: JsonFileStore::in_memory(),
            fail_lookup: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl PostStore for FlakyStore {
    async fn exists_by_title(&self, title: &str) -> Result<bool> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        self.inner.exists_by_title(title).await
    }
    async fn insert_posted(&self, record: &PostedRecord) -> Result<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(anyhow!("insert rejected"));
        }
        self.inner.insert_posted(record).await
    }
    async fn count_all(&self) -> Result<u64> {
        self.inner.count_all().await
    }
    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64> {
        self.inner.count_since(since).await
    }
    async fn list_recent(&self, limit: usize) -> Result<Vec<PostedRecord>> {
        self.inner.list_recent(limit).await
    }
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.inner.delete_older_than(cutoff).await
    }
    async fn source_counts(&self) -> Result<BTreeMap<String, u64>> {
        self.inner.source_counts().await
    }
    async fn health(&self) -> StoreHealth {
        self.inner.health().await
    }
    fn backend(&self) -> &'static str {
        "flaky"
    }
}

/// Everything a test bot needs; keeps handles on the stubs for assertions.
pub struct Harness {
    pub sleeper: Arc<RecordingSleeper>,
    pub generator: Arc<StubGenerator>,
    pub publisher: Arc<StubPublisher>,
    pub store: Arc<FlakyStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            sleeper: Arc::new(RecordingSleeper::new()),
            generator: StubGenerator::ok(GOOD_POST),
            publisher: StubPublisher::ok(),
            store: FlakyStore::new(),
        }
    }

    pub fn with_generator(mut self, g: Arc<StubGenerator>) -> Self {
        self.generator = g;
        self
    }

    pub fn with_publisher(mut self, p: Arc<StubPublisher>) -> Self {
        self.publisher = p;
        self
    }

    pub fn bot(&self, providers: Vec<Arc<dyn NewsProvider>>) -> CryptoBot {
        let acquirer = Acquirer::new(providers, RETRY_DELAY, self.sleeper.clone());
        let deps = BotDeps {
            acquirer,
            filter: NewsFilter::default(),
            generator: self.generator.clone(),
            publisher: self.publisher.clone(),
            store: self.store.clone(),
            sleeper: self.sleeper.clone(),
            content: ContentRules::default(),
        };
        let policy = CooldownPolicy {
            max_consecutive_failures: 5,
            cooldown: COOLDOWN,
        };
        CryptoBot::new(deps, policy, StdRng::seed_from_u64(42))
    }
}
