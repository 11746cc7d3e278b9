// src/store/mod.rs
//! Persistent record of published posts.
//!
//! One `PostedRecord` per successful publish. Records are never mutated and
//! only removed by age-based cleanup. The title is the dedup key.

pub mod file;
pub mod supabase;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use file::JsonFileStore;
pub use supabase::SupabaseStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostedRecord {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreHealth {
    pub status: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_access: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreHealth {
    pub fn healthy(database: &str) -> Self {
        Self {
            status: "healthy".into(),
            database: database.into(),
            table_access: Some(true),
            error: None,
        }
    }

    pub fn unhealthy(database: &str, error: impl ToString) -> Self {
        Self {
            status: "unhealthy".into(),
            database: database.into(),
            table_access: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    /// Exact, case-sensitive title match.
    async fn exists_by_title(&self, title: &str) -> Result<bool>;
    async fn insert_posted(&self, record: &PostedRecord) -> Result<()>;
    async fn count_all(&self) -> Result<u64>;
    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64>;
    /// Newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<PostedRecord>>;
    /// Remove records with `posted_at < cutoff`; returns how many were removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
    async fn source_counts(&self) -> Result<BTreeMap<String, u64>>;
    async fn health(&self) -> StoreHealth;
    /// Backend name for status payloads, e.g. "supabase".
    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BotStats {
    pub total_posts: u64,
    pub today_posts: u64,
    pub last_24h_posts: u64,
    /// Posts in the last 24h per hour, as a percentage capped at 100.
    pub success_rate: f64,
    pub source_stats: BTreeMap<String, u64>,
    pub database: String,
}

impl BotStats {
    fn empty(database: &str) -> Self {
        Self {
            total_posts: 0,
            today_posts: 0,
            last_24h_posts: 0,
            success_rate: 0.0,
            source_stats: BTreeMap::new(),
            database: database.into(),
        }
    }
}

pub fn success_rate(last_24h_posts: u64) -> f64 {
    ((last_24h_posts as f64 / 24.0) * 100.0).min(100.0)
}

/// Aggregate statistics. Any store error yields zeroes with `database = "error"`.
pub async fn collect_stats(store: &dyn PostStore, now: DateTime<Utc>) -> BotStats {
    match try_collect_stats(store, now).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, backend = store.backend(), "stats query failed");
            BotStats::empty("error")
        }
    }
}

async fn try_collect_stats(store: &dyn PostStore, now: DateTime<Utc>) -> Result<BotStats> {
    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);

    let total_posts = store.count_all().await?;
    let today_posts = store.count_since(today_start).await?;
    let last_24h_posts = store.count_since(now - Duration::hours(24)).await?;
    let source_stats = store.source_counts().await?;

    Ok(BotStats {
        total_posts,
        today_posts,
        last_24h_posts,
        success_rate: success_rate(last_24h_posts),
        source_stats,
        database: store.backend().to_string(),
    })
}

/// `now - days`, saturating at the earliest representable instant.
pub fn retention_cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Retention cleanup: remove records older than `days` days.
pub async fn cleanup_older_than_days(
    store: &dyn PostStore,
    days: u32,
    now: DateTime<Utc>,
) -> Result<u64> {
    let cutoff = retention_cutoff(now, days);
    let n = store.delete_older_than(cutoff).await?;
    tracing::info!(deleted = n, days, backend = store.backend(), "cleaned up old records");
    Ok(n)
}
