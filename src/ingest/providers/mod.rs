// src/ingest/providers/mod.rs
//! Provider table and payload normalization.
//!
//! Each news API returns its own JSON shape. Instead of branching per provider,
//! a `ProviderDescriptor` row says where the article list lives and which field holds
//! the timestamp; `normalize_payload` does the rest for every provider.

pub mod rapidapi;

use serde_json::Value;

use crate::ingest::normalize_text;
use crate::ingest::types::Candidate;

pub use rapidapi::RapidApiProvider;

/// Only the head of each payload is considered.
pub const MAX_ITEMS_PER_FETCH: usize = 10;

/// Completeness gate applied by providers, weaker than the analyzer's validation.
pub const MIN_RAW_TITLE_LEN: usize = 10;
pub const MIN_RAW_DESCRIPTION_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub id: &'static str,
    /// Base URL, without trailing slash.
    pub base_url: &'static str,
    pub path: &'static str,
    /// Value for the `X-RapidAPI-Host` header.
    pub rapidapi_host: &'static str,
    /// Object keys leading to the article array. Empty = payload is the array.
    pub items_path: &'static [&'static str],
    pub published_field: &'static str,
}

pub const PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        id: "coingecko",
        base_url: "https://coingecko.p.rapidapi.com",
        path: "/news",
        rapidapi_host: "coingecko.p.rapidapi.com",
        items_path: &["data", "news"],
        published_field: "created_at",
    },
    ProviderDescriptor {
        id: "coinranking",
        base_url: "https://coinranking1.p.rapidapi.com",
        path: "/news",
        rapidapi_host: "coinranking1.p.rapidapi.com",
        items_path: &["data", "news"],
        published_field: "published_at",
    },
    ProviderDescriptor {
        id: "coinpaprika",
        base_url: "https://coinpaprika1.p.rapidapi.com",
        path: "/news",
        rapidapi_host: "coinpaprika1.p.rapidapi.com",
        items_path: &[],
        published_field: "date",
    },
];

pub fn descriptor_for(id: &str) -> Option<&'static ProviderDescriptor> {
    PROVIDERS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Read a string field; absent, null or non-string values become "".
/// Numbers are rendered (some APIs send unix timestamps).
fn str_field(article: &Value, key: &str) -> String {
    match article.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Locate the article array inside a payload. `None` if the shape doesn't match.
pub fn article_list<'a>(desc: &ProviderDescriptor, payload: &'a Value) -> Option<&'a Vec<Value>> {
    let mut cur = payload;
    for key in desc.items_path {
        cur = cur.get(key)?;
    }
    cur.as_array()
}

/// Map one article object into a raw candidate. Text fields are normalized.
pub fn to_candidate(desc: &ProviderDescriptor, article: &Value) -> Candidate {
    Candidate {
        title: normalize_text(&str_field(article, "title")),
        description: normalize_text(&str_field(article, "description")),
        url: str_field(article, "url").trim().to_string(),
        published_at: str_field(article, desc.published_field),
        source: desc.id.to_string(),
        author: str_field(article, "author").trim().to_string(),
        quality_score: None,
    }
}

/// Minimal per-item gate: title >= 10 chars, description >= 20 chars, url present.
pub fn is_complete(c: &Candidate) -> bool {
    c.title.chars().count() >= MIN_RAW_TITLE_LEN
        && c.description.chars().count() >= MIN_RAW_DESCRIPTION_LEN
        && !c.url.is_empty()
}

/// Normalize a whole payload: first `MAX_ITEMS_PER_FETCH` articles, complete ones only.
/// Returns `None` when the payload doesn't have the expected shape.
pub fn normalize_payload(desc: &ProviderDescriptor, payload: &Value) -> Option<Vec<Candidate>> {
    let list = article_list(desc, payload)?;
    Some(
        list.iter()
            .take(MAX_ITEMS_PER_FETCH)
            .map(|a| to_candidate(desc, a))
            .filter(is_complete)
            .collect(),
    )
}
