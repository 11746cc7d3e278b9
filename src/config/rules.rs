//! # Bot Rules
//!
//! Hand-weighted tables that drive news filtering and post generation:
//! importance keywords with weights, spam phrases, reliable sources, length
//! thresholds, tweet styles, the hashtag topic table and the post quality bounds.
//!
//! - Loads from TOML (`config/bot_rules.toml` or `$BOT_RULES_PATH`).
//! - Falls back to the built-in `default_seed()` when the file is missing or invalid.
//! - Every section is optional in the file; missing sections take the seed values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::Path};

pub const DEFAULT_RULES_PATH: &str = "config/bot_rules.toml";
pub const ENV_RULES_PATH: &str = "BOT_RULES_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct BotRules {
    #[serde(default)]
    pub scoring: ScoringRules,
    #[serde(default)]
    pub content: ContentRules,
}

/// Thresholds and tables used by the validator/scorer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub min_title_len: usize,
    pub min_description_len: usize,
    /// Titles longer than this earn `long_title_bonus`.
    pub long_title_len: usize,
    pub long_title_bonus: f64,
    /// Descriptions longer than this earn `long_description_bonus`.
    pub long_description_len: usize,
    pub long_description_bonus: f64,
    pub reliable_source_bonus: f64,
    /// Lowercase keyword -> weight. Each keyword counts at most once per item.
    pub keywords: BTreeMap<String, f64>,
    pub spam_phrases: Vec<String>,
    pub reliable_sources: Vec<String>,
}

/// One entry of the ordered hashtag table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HashtagTopic {
    pub topic: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentRules {
    pub base_hashtag: String,
    pub max_hashtags: usize,
    /// First topic found in the news text wins.
    pub hashtags: Vec<HashtagTopic>,
    pub ai_phrases: Vec<String>,
    pub min_post_len: usize,
    pub max_post_len: usize,
}

impl Default for ScoringRules {
    fn default() -> Self {
        let keywords = [
            ("bitcoin", 5.0),
            ("ethereum", 4.0),
            ("crypto", 3.0),
            ("blockchain", 3.0),
            ("defi", 4.0),
            ("nft", 3.0),
            ("web3", 4.0),
            ("trading", 3.0),
            ("market", 3.0),
            ("price", 3.0),
            ("bullish", 4.0),
            ("bearish", 4.0),
            ("regulation", 5.0),
            ("sec", 5.0),
            ("binance", 4.0),
            ("coinbase", 4.0),
        ]
        .into_iter()
        .map(|(k, w)| (k.to_string(), w))
        .collect();

        let spam_phrases = [
            "buy now",
            "limited offer",
            "sign up",
            "click here",
            "discount",
            "promotion",
            "get rich",
            "make money",
            "investment opportunity",
            "free money",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            min_title_len: 10,
            min_description_len: 50,
            long_title_len: 30,
            long_title_bonus: 2.0,
            long_description_len: 100,
            long_description_bonus: 3.0,
            reliable_source_bonus: 2.0,
            keywords,
            spam_phrases,
            reliable_sources: vec!["coingecko".into(), "coinranking".into()],
        }
    }
}

impl Default for ContentRules {
    fn default() -> Self {
        let topic = |t: &str, tags: &[&str]| HashtagTopic {
            topic: t.to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            base_hashtag: "Crypto".into(),
            max_hashtags: 3,
            hashtags: vec![
                topic("bitcoin", &["Bitcoin", "BTC", "Crypto"]),
                topic("ethereum", &["Ethereum", "ETH", "Crypto"]),
                topic("defi", &["DeFi", "Crypto"]),
                topic("nft", &["NFT", "Crypto"]),
                topic("web3", &["Web3", "Crypto"]),
                topic("trading", &["Trading", "Crypto"]),
                topic("market", &["Market", "Crypto"]),
                topic("blockchain", &["Blockchain", "Crypto"]),
                topic("altcoin", &["Altcoin", "Crypto"]),
            ],
            ai_phrases: [
                "as an ai",
                "according to the data",
                "based on the analysis",
                "the model suggests",
                "generated by",
                "artificial intelligence",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            min_post_len: 50,
            max_post_len: 275,
        }
    }
}

impl BotRules {
    /// Built-in tables, used when no rules file is available.
    pub fn default_seed() -> Self {
        Self {
            scoring: ScoringRules::default(),
            content: ContentRules::default(),
        }
    }

    /// Parse rules from a TOML string and normalize them.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let rules: BotRules = toml::from_str(s).context("parsing bot rules toml")?;
        Ok(rules.normalized())
    }

    /// Load from an explicit path. Errors are returned, not swallowed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading bot rules from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load from `$BOT_RULES_PATH` or `config/bot_rules.toml`.
    /// Falls back to `default_seed()` on any error.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_RULES_PATH).unwrap_or_else(|_| DEFAULT_RULES_PATH.into());
        match Self::load_from(Path::new(&path)) {
            Ok(r) => {
                tracing::info!(path = %path, keywords = r.scoring.keywords.len(), "bot rules loaded");
                r
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path, "bot rules unavailable, using built-in seed");
                Self::default_seed()
            }
        }
    }

    /// Lowercase every matching table so lookups can compare against lowercased text.
    fn normalized(mut self) -> Self {
        let lower = |v: &mut Vec<String>| {
            for s in v.iter_mut() {
                *s = s.trim().to_lowercase();
            }
            v.retain(|s| !s.is_empty());
        };

        self.scoring.keywords = self
            .scoring
            .keywords
            .into_iter()
            .map(|(k, w)| (k.trim().to_lowercase(), w.max(0.0)))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        lower(&mut self.scoring.spam_phrases);
        lower(&mut self.scoring.reliable_sources);
        lower(&mut self.content.ai_phrases);
        for t in self.content.hashtags.iter_mut() {
            t.topic = t.topic.trim().to_lowercase();
        }

        if self.content.min_post_len > self.content.max_post_len {
            std::mem::swap(&mut self.content.min_post_len, &mut self.content.max_post_len);
        }
        if self.content.max_hashtags == 0 {
            self.content.max_hashtags = 1;
        }
        self
    }
}
