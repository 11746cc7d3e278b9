//! Post generation: provider abstraction, prompt, hashtags, cleanup and quality gate.
//!
//! The provider only turns a prompt into raw text. Everything that decides
//! whether that text is publishable (cleanup, length bounds, hashtag presence,
//! AI-sounding phrases) lives here so every provider gets the same treatment.

pub mod gemini;

use anyhow::{bail, Result};
use rand::Rng;
use serde::Serialize;
use std::fmt;

use crate::config::ContentRules;
use crate::ingest::types::Candidate;

pub use gemini::GeminiGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TweetStyle {
    BreakingNews,
    AnalyticalInsight,
    CommunityEngagement,
    EducationalContent,
    MarketAnalysis,
}

impl TweetStyle {
    pub const ALL: [TweetStyle; 5] = [
        TweetStyle::BreakingNews,
        TweetStyle::AnalyticalInsight,
        TweetStyle::CommunityEngagement,
        TweetStyle::EducationalContent,
        TweetStyle::MarketAnalysis,
    ];

    /// Uniform pick from `ALL`.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TweetStyle::BreakingNews => "breaking_news",
            TweetStyle::AnalyticalInsight => "analytical_insight",
            TweetStyle::CommunityEngagement => "community_engagement",
            TweetStyle::EducationalContent => "educational_content",
            TweetStyle::MarketAnalysis => "market_analysis",
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            TweetStyle::BreakingNews => "urgent and timely, make the importance obvious",
            TweetStyle::AnalyticalInsight => "analytical, spell out the market implications",
            TweetStyle::CommunityEngagement => "conversational, invite replies with a question",
            TweetStyle::EducationalContent => "informative, explain the concept behind the news",
            TweetStyle::MarketAnalysis => "focus on price and trading implications",
        }
    }
}

impl fmt::Display for TweetStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait::async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Raw generated text for `news`. Callers run it through `polish_tweet`.
    async fn generate(&self, news: &Candidate, style: TweetStyle, hashtags: &[String])
        -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

/// Used when no generation backend is configured; every call fails.
pub struct DisabledGenerator;

#[async_trait::async_trait]
impl ContentGenerator for DisabledGenerator {
    async fn generate(&self, _: &Candidate, _: TweetStyle, _: &[String]) -> Result<String> {
        bail!("content generation disabled (GEMINI_API_KEY not set)")
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Capitalize the first letter, lowercase the rest ("coingecko" -> "Coingecko").
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Base tag, then the tags of the first topic found in the text, then the source.
/// Duplicates removed keeping first position; at most `max_hashtags`.
pub fn smart_hashtags(news: &Candidate, rules: &ContentRules) -> Vec<String> {
    let content = news.combined_text_lower();
    let mut tags = vec![rules.base_hashtag.clone()];

    if let Some(t) = rules.hashtags.iter().find(|t| content.contains(t.topic.as_str())) {
        tags.extend(t.tags.iter().cloned());
    }

    let source = title_case(news.source.trim());
    if !source.is_empty() {
        tags.push(source);
    }

    let mut out: Vec<String> = Vec::with_capacity(rules.max_hashtags);
    for t in tags {
        if !t.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(&t)) {
            out.push(t);
        }
    }
    out.truncate(rules.max_hashtags);
    out
}

pub fn build_prompt(
    news: &Candidate,
    style: TweetStyle,
    hashtags: &[String],
    rules: &ContentRules,
) -> String {
    let tags = hashtags
        .iter()
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ");
    let source = if news.source.is_empty() {
        "unknown"
    } else {
        news.source.as_str()
    };
    format!(
        "Write one post for X (Twitter) about the cryptocurrency news below, for an audience of crypto traders and builders.\n\
         \n\
         Title: {title}\n\
         Description: {description}\n\
         Source: {source}\n\
         \n\
         Style: {style} ({guidance}).\n\
         Length: between {min} and {max} characters, hashtags included.\n\
         Requirements:\n\
         - open with a hook, then one concrete insight on what this means for the market or community\n\
         - use 2-3 of these hashtags: {tags}\n\
         - sound like an experienced human analyst, never mention being an AI or a model\n\
         - optionally end with a short question or call to action\n\
         \n\
         Reply with the post text only.",
        title = news.title,
        description = news.description,
        style = style,
        guidance = style.guidance(),
        min = rules.min_post_len,
        max = rules.max_post_len,
    )
}

/// Remove quote characters, drop non-ASCII, collapse whitespace, trim.
pub fn clean_tweet(raw: &str) -> String {
    let ascii: String = raw
        .chars()
        .filter(|c| *c != '"' && *c != '\'' && c.is_ascii())
        .collect();
    ascii.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityIssue {
    Length(usize),
    NoHashtag,
    SoundsGenerated,
}

/// Length within bounds, at least one `#`, no AI-sounding phrase.
pub fn check_tweet(text: &str, rules: &ContentRules) -> Result<(), QualityIssue> {
    let len = text.chars().count();
    if len < rules.min_post_len || len > rules.max_post_len {
        return Err(QualityIssue::Length(len));
    }
    if !text.contains('#') {
        return Err(QualityIssue::NoHashtag);
    }
    let lower = text.to_lowercase();
    if rules.ai_phrases.iter().any(|p| lower.contains(p.as_str())) {
        return Err(QualityIssue::SoundsGenerated);
    }
    Ok(())
}

/// Cleanup + quality gate. `None` when the text isn't publishable.
pub fn polish_tweet(raw: &str, rules: &ContentRules) -> Option<String> {
    let text = clean_tweet(raw);
    match check_tweet(&text, rules) {
        Ok(()) => Some(text),
        Err(issue) => {
            tracing::warn!(?issue, "generated post failed quality check");
            None
        }
    }
}
