pub mod oauth1;
pub mod twitter;

use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};

pub use oauth1::OAuth1Signer;
pub use twitter::TwitterPublisher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub post_id: String,
}

/// Outbound channel for generated posts. Not idempotent: calling `publish`
/// twice with the same text posts twice, so dedup happens before generation.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PublishReceipt>;
    async fn verify_credentials(&self) -> bool;
    fn name(&self) -> &'static str;
}

/// Logs posts instead of sending them (`DRY_RUN=1`).
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    seq: AtomicU64,
}

#[async_trait::async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Result<PublishReceipt> {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(chars = text.chars().count(), %text, "dry run: post not sent");
        Ok(PublishReceipt {
            post_id: format!("dry-run-{n}"),
        })
    }

    async fn verify_credentials(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
