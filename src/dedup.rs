//! Dedup gate: a candidate is a duplicate when its exact title was already posted.
//! No fuzzy matching; reworded headlines of the same story pass.

use anyhow::{Context, Result};

use crate::store::PostStore;

pub struct DedupGate<'a> {
    store: &'a dyn PostStore,
}

impl<'a> DedupGate<'a> {
    pub fn new(store: &'a dyn PostStore) -> Self {
        Self { store }
    }

    /// Lookup errors propagate: an unverifiable title is never treated as new.
    pub async fn is_duplicate(&self, title: &str) -> Result<bool> {
        let exists = self
            .store
            .exists_by_title(title)
            .await
            .context("dedup lookup")?;
        if exists {
            tracing::debug!(title = %title.chars().take(50).collect::<String>(), "news already posted");
        }
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonFileStore, PostedRecord};

    #[tokio::test]
    async fn exact_title_only() {
        let store = JsonFileStore::in_memory();
        store
            .insert_posted(&PostedRecord {
                title: "SEC delays ETF decision".into(),
                url: String::new(),
                content: String::new(),
                source: "coingecko".into(),
                posted_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        let gate = DedupGate::new(&store);
        assert!(gate.is_duplicate("SEC delays ETF decision").await.unwrap());
        assert!(!gate.is_duplicate("SEC delays ETF decision.").await.unwrap());
        assert!(!gate.is_duplicate("sec delays etf decision").await.unwrap());
    }
}
