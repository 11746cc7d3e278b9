// src/generate/gemini.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_prompt, ContentGenerator, TweetStyle};
use crate::config::ContentRules;
use crate::ingest::types::Candidate;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent` client.
pub struct GeminiGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    rules: ContentRules,
}

impl GeminiGenerator {
    pub fn new(
        api_key: String,
        model: String,
        timeout: Duration,
        rules: ContentRules,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("crypto-news-bot/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            rules,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Req<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<RespCandidate>,
}
#[derive(Deserialize)]
struct RespCandidate {
    content: Option<RespContent>,
}
#[derive(Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}
#[derive(Deserialize)]
struct RespPart {
    #[serde(default)]
    text: String,
}

#[async_trait::async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate(
        &self,
        news: &Candidate,
        style: TweetStyle,
        hashtags: &[String],
    ) -> Result<String> {
        let prompt = build_prompt(news, style, hashtags, &self.rules);
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.8,
                max_output_tokens: 256,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .context("gemini request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("gemini returned {status}: {body}"));
        }

        let body: Resp = resp.json().await.context("gemini response body")?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(anyhow!("gemini returned no text"));
        }
        tracing::info!(model = %self.model, style = %style, "post text generated");
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
