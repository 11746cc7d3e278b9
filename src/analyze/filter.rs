//! Validation and quality scoring for single news items.
//!
//! Validation, in order, short-circuiting:
//! 1. title present and >= `min_title_len` chars
//! 2. description present and >= `min_description_len` chars
//! 3. neither title nor description contains a spam phrase (case-insensitive)
//! 4. title + description contains at least one importance keyword
//!
//! Score is purely additive: keyword weights (each keyword once), a bonus for
//! a long title, a bonus for a long description, a bonus for a reliable source.
//! No normalization, never negative with non-negative weights.

use crate::config::ScoringRules;
use crate::ingest::types::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TitleTooShort,
    DescriptionTooShort,
    Spam,
    OffTopic,
}

#[derive(Debug, Clone)]
pub struct NewsFilter {
    rules: ScoringRules,
}

impl Default for NewsFilter {
    fn default() -> Self {
        Self::new(ScoringRules::default())
    }
}

impl NewsFilter {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn validate(&self, item: &Candidate) -> bool {
        self.check(item).is_ok()
    }

    /// Like `validate`, reporting the first rule that failed.
    pub fn check(&self, item: &Candidate) -> Result<(), Rejection> {
        let title = item.title.trim();
        let description = item.description.trim();

        if title.is_empty() || title.chars().count() < self.rules.min_title_len {
            return Err(Rejection::TitleTooShort);
        }
        if description.is_empty() || description.chars().count() < self.rules.min_description_len {
            return Err(Rejection::DescriptionTooShort);
        }
        if self.contains_spam(title) || self.contains_spam(description) {
            return Err(Rejection::Spam);
        }
        if !self.contains_important_topic(&format!("{title} {description}")) {
            return Err(Rejection::OffTopic);
        }
        Ok(())
    }

    pub fn contains_spam(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.rules.spam_phrases.iter().any(|p| lower.contains(p.as_str()))
    }

    pub fn contains_important_topic(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.rules.keywords.keys().any(|k| lower.contains(k.as_str()))
    }

    pub fn score(&self, item: &Candidate) -> f64 {
        let title = item.title.trim();
        let description = item.description.trim();
        let content = format!("{title} {description}").to_lowercase();

        let mut score: f64 = self
            .rules
            .keywords
            .iter()
            .filter(|(k, _)| content.contains(k.as_str()))
            .map(|(_, w)| *w)
            .sum();

        if title.chars().count() > self.rules.long_title_len {
            score += self.rules.long_title_bonus;
        }
        if description.chars().count() > self.rules.long_description_len {
            score += self.rules.long_description_bonus;
        }

        let source = item.source.trim().to_lowercase();
        if self.rules.reliable_sources.iter().any(|s| *s == source) {
            score += self.rules.reliable_source_bonus;
        }

        score
    }

    /// Keep valid items, in input order, each with `quality_score` attached.
    pub fn filter_news(&self, items: Vec<Candidate>) -> Vec<Candidate> {
        let total = items.len();
        let mut kept = Vec::with_capacity(total);
        for mut item in items {
            match self.check(&item) {
                Ok(()) => {
                    item.quality_score = Some(self.score(&item));
                    kept.push(item);
                }
                Err(why) => {
                    tracing::debug!(?why, title = %truncate(&item.title, 50), "news rejected");
                }
            }
        }
        tracing::info!(valid = kept.len(), total, "filtered news");
        kept
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
