// src/ingest/providers/rapidapi.rs
use anyhow::Context;
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::{normalize_payload, ProviderDescriptor};
use crate::ingest::types::{Candidate, Fetched, NewsProvider};

/// News provider reached through RapidAPI. One instance per `ProviderDescriptor`.
pub struct RapidApiProvider {
    desc: &'static ProviderDescriptor,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RapidApiProvider {
    pub fn new(
        desc: &'static ProviderDescriptor,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("crypto-news-bot/0.1")
            .timeout(timeout)
            .build()
            .with_context(|| format!("building http client for {}", desc.id))?;
        Ok(Self {
            desc,
            base_url: desc.base_url.to_string(),
            api_key,
            client,
        })
    }

    /// Point the provider at another host (local mocks, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn classify_status(status: StatusCode) -> Fetched {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Fetched::Fatal(format!("credentials rejected ({status})"))
        } else {
            Fetched::Transient(format!("http status {status}"))
        }
    }

    fn finish(&self, items: Vec<Candidate>) -> Fetched {
        counter!("news_candidates_total", "provider" => self.desc.id).increment(items.len() as u64);
        if items.is_empty() {
            Fetched::Empty
        } else {
            Fetched::Batch(items)
        }
    }
}

#[async_trait]
impl NewsProvider for RapidApiProvider {
    async fn fetch_batch(&self) -> Fetched {
        let Some(key) = self.api_key.as_deref() else {
            return Fetched::Fatal("RAPIDAPI_KEY not configured".into());
        };

        let t0 = std::time::Instant::now();
        let url = format!("{}{}", self.base_url, self.desc.path);
        let resp = match self
            .client
            .get(&url)
            .header("X-RapidAPI-Key", key)
            .header("X-RapidAPI-Host", self.desc.rapidapi_host)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Fetched::Transient(format!("timeout: {e}")),
            Err(e) => return Fetched::Transient(format!("request failed: {e}")),
        };

        if !resp.status().is_success() {
            return Self::classify_status(resp.status());
        }

        let payload: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => return Fetched::Transient(format!("unreadable payload: {e}")),
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_fetch_ms", "provider" => self.desc.id).record(ms);

        match normalize_payload(self.desc, &payload) {
            Some(items) => {
                tracing::info!(provider = self.desc.id, items = items.len(), "fetched news batch");
                self.finish(items)
            }
            None => {
                tracing::warn!(provider = self.desc.id, "payload shape not recognized");
                Fetched::Empty
            }
        }
    }

    fn id(&self) -> &str {
        self.desc.id
    }
}
