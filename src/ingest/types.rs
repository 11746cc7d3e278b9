// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// A news item under consideration for posting.
///
/// Raw items come out of a provider with `quality_score = None`; the filter
/// attaches a score only to items that pass validation. Missing fields
/// deserialize to empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Candidate {
    pub title: String,
    pub description: String,
    pub url: String,
    /// Source-specific timestamp, kept verbatim.
    pub published_at: String,
    /// Provider id, e.g. "coingecko".
    pub source: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl Candidate {
    /// Title and description joined by a space, lowercased.
    pub fn combined_text_lower(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

/// Outcome of a single provider fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// Non-empty batch of normalized items.
    Batch(Vec<Candidate>),
    /// Provider answered but nothing usable came back.
    Empty,
    /// Timeout, 5xx, unreadable payload. Worth trying again later.
    Transient(String),
    /// Misconfiguration (missing key, rejected credentials). Retrying won't help.
    Fatal(String),
}

impl Fetched {
    /// Batch contents, or `None` for every non-batch outcome.
    pub fn into_batch(self) -> Option<Vec<Candidate>> {
        match self {
            Fetched::Batch(v) if !v.is_empty() => Some(v),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Fetched::Batch(_) => "batch",
            Fetched::Empty => "empty",
            Fetched::Transient(_) => "transient",
            Fetched::Fatal(_) => "fatal",
        }
    }
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch one batch of normalized candidates. Never panics, never errors:
    /// every failure is folded into a `Fetched` variant.
    async fn fetch_batch(&self) -> Fetched;
    fn id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let c: Candidate = serde_json::from_str(r#"{"title":"Only a title here"}"#).unwrap();
        assert_eq!(c.title, "Only a title here");
        assert!(c.description.is_empty());
        assert!(c.url.is_empty());
        assert_eq!(c.quality_score, None);
    }

    #[test]
    fn empty_batch_is_not_a_batch() {
        assert_eq!(Fetched::Batch(vec![]).into_batch(), None);
        assert_eq!(Fetched::Empty.into_batch(), None);
        assert_eq!(Fetched::Transient("503".into()).into_batch(), None);
    }
}
