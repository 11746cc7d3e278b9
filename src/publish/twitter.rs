use anyhow::{anyhow, Context, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::oauth1::OAuth1Signer;
use super::{PublishReceipt, Publisher};
use crate::config::XCredentials;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// X/Twitter API v2 client. Requests are signed with the app's consumer keys
/// and the bot account's access token (OAuth 1.0a), which do not expire.
pub struct TwitterPublisher {
    signer: Option<OAuth1Signer>,
    base_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct CreatedTweet {
    id: String,
}

#[derive(Deserialize)]
struct Me {
    #[allow(dead_code)]
    id: String,
}

impl TwitterPublisher {
    pub fn new(creds: Option<XCredentials>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("crypto-news-bot/0.1")
            .timeout(timeout)
            .build()
            .context("building x http client")?;
        Ok(Self {
            signer: creds.map(OAuth1Signer::new),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn signer(&self) -> Result<&OAuth1Signer> {
        self.signer
            .as_ref()
            .ok_or_else(|| anyhow!("X API keys not configured"))
    }
}

#[async_trait::async_trait]
impl Publisher for TwitterPublisher {
    async fn publish(&self, text: &str) -> Result<PublishReceipt> {
        let url = format!("{}/2/tweets", self.base_url);
        let auth = self.signer()?.authorize("POST", &url)?;
        let body = serde_json::json!({ "text": text });

        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
            .context("x post")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(anyhow!("x post failed with {status}: {detail}"));
        }

        // Accepted means published; a missing id must not turn into a repost.
        let id = resp
            .json::<Envelope<CreatedTweet>>()
            .await
            .ok()
            .and_then(|e| e.data)
            .map(|d| d.id);
        let post_id = match id {
            Some(id) => id,
            None => {
                tracing::warn!(%status, "x accepted the post without returning an id");
                String::new()
            }
        };
        tracing::info!(post_id = %post_id, "post published");
        Ok(PublishReceipt { post_id })
    }

    async fn verify_credentials(&self) -> bool {
        let Ok(signer) = self.signer() else {
            tracing::debug!("X disabled (API keys not set)");
            return false;
        };
        let url = format!("{}/2/users/me", self.base_url);
        let auth = match signer.authorize("GET", &url) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, "x request signing failed");
                return false;
            }
        };
        let res = self.client.get(&url).header(AUTHORIZATION, auth).send().await;
        match res {
            Ok(rsp) if rsp.status().is_success() => rsp
                .json::<Envelope<Me>>()
                .await
                .map(|e| e.data.is_some())
                .unwrap_or(false),
            Ok(rsp) => {
                tracing::warn!(status = %rsp.status(), "x credentials rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "x credentials check failed");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "x"
    }
}
