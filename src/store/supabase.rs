// src/store/supabase.rs
//! Supabase (PostgREST) backed store. Table layout:
//! `posted_news(id, title, url, content, source, posted_at timestamptz)`.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header::HeaderMap, RequestBuilder, Response};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::{PostStore, PostedRecord, StoreHealth};
use crate::config::SupabaseConfig;

const RECORD_COLUMNS: &str = "title,url,content,source,posted_at";

pub struct SupabaseStore {
    client: reqwest::Client,
    endpoint: String,
    key: String,
}

impl SupabaseStore {
    pub fn new(cfg: &SupabaseConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("crypto-news-bot/0.1")
            .timeout(timeout)
            .build()
            .context("building supabase http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", cfg.url.trim_end_matches('/'), cfg.table),
            key: cfg.key.clone(),
        })
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("apikey", &self.key).bearer_auth(&self.key)
    }

    fn get(&self) -> RequestBuilder {
        self.authed(self.client.get(&self.endpoint))
    }

    async fn send(rb: RequestBuilder, what: &str) -> Result<Response> {
        let resp = rb.send().await.with_context(|| format!("supabase {what}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("supabase {what} failed with {status}: {body}"));
        }
        Ok(resp)
    }

    /// Exact row count for an optional filter, read from `Content-Range: a-b/N`.
    async fn count_where(&self, filter: Option<(&str, String)>) -> Result<u64> {
        let mut rb = self
            .get()
            .header("Prefer", "count=exact")
            .query(&[("select", "id"), ("limit", "1")]);
        if let Some((col, expr)) = filter {
            rb = rb.query(&[(col, expr)]);
        }
        let resp = Self::send(rb, "count").await?;
        parse_content_range_total(resp.headers())
            .ok_or_else(|| anyhow!("supabase count: missing or invalid Content-Range"))
    }
}

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse the total from a PostgREST `Content-Range` header (`0-9/120`, `*/0`).
pub fn parse_content_range_total(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get("content-range")?.to_str().ok()?;
    raw.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait::async_trait]
impl PostStore for SupabaseStore {
    async fn exists_by_title(&self, title: &str) -> Result<bool> {
        #[derive(Deserialize)]
        struct IdRow {
            #[allow(dead_code)]
            id: serde_json::Value,
        }
        let rb = self.get().query(&[
            ("select", "id".to_string()),
            ("title", format!("eq.{title}")),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<IdRow> = Self::send(rb, "title lookup")
            .await?
            .json()
            .await
            .context("supabase title lookup: decoding rows")?;
        Ok(!rows.is_empty())
    }

    async fn insert_posted(&self, record: &PostedRecord) -> Result<()> {
        let rb = self
            .authed(self.client.post(&self.endpoint))
            .header("Prefer", "return=minimal")
            .json(&[record]);
        Self::send(rb, "insert").await?;
        Ok(())
    }

    async fn count_all(&self) -> Result<u64> {
        self.count_where(None).await
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64> {
        self.count_where(Some(("posted_at", format!("gte.{}", ts(since)))))
            .await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PostedRecord>> {
        let rb = self.get().query(&[
            ("select", RECORD_COLUMNS.to_string()),
            ("order", "posted_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);
        Self::send(rb, "recent posts")
            .await?
            .json()
            .await
            .context("supabase recent posts: decoding rows")
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let rb = self
            .authed(self.client.delete(&self.endpoint))
            .header("Prefer", "return=representation")
            .query(&[
                ("posted_at", format!("lt.{}", ts(cutoff))),
                ("select", "id".to_string()),
            ]);
        let rows: Vec<serde_json::Value> = Self::send(rb, "cleanup")
            .await?
            .json()
            .await
            .context("supabase cleanup: decoding rows")?;
        Ok(rows.len() as u64)
    }

    async fn source_counts(&self) -> Result<BTreeMap<String, u64>> {
        #[derive(Deserialize)]
        struct SourceRow {
            #[serde(default)]
            source: Option<String>,
        }
        let rb = self.get().query(&[("select", "source")]);
        let rows: Vec<SourceRow> = Self::send(rb, "source stats")
            .await?
            .json()
            .await
            .context("supabase source stats: decoding rows")?;
        let mut out = BTreeMap::new();
        for r in rows {
            *out.entry(r.source.unwrap_or_default()).or_insert(0) += 1;
        }
        Ok(out)
    }

    async fn health(&self) -> StoreHealth {
        let rb = self.get().query(&[("select", "id"), ("limit", "1")]);
        match Self::send(rb, "health").await {
            Ok(_) => StoreHealth::healthy(self.backend()),
            Err(e) => StoreHealth::unhealthy(self.backend(), format!("{e:#}")),
        }
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}
