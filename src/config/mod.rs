// src/config/mod.rs
//! Runtime configuration. Secrets and knobs come from the environment
//! (after `dotenvy::dotenv()`), keyword tables from `rules`.

pub mod rules;

use std::time::Duration;

pub use rules::{
    BotRules, ContentRules, HashtagTopic, ScoringRules, DEFAULT_RULES_PATH, ENV_RULES_PATH,
};

pub const DEFAULT_NEWS_SOURCES: [&str; 3] = ["coingecko", "coinranking", "coinpaprika"];
pub const DEFAULT_STORE_PATH: &str = "state/posted_news.json";
pub const DEFAULT_SUPABASE_TABLE: &str = "posted_news";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Supabase connection settings; present only when both URL and key are set.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
    pub table: String,
}

/// X app and user keys for OAuth 1.0a signing; present only when all four are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub rapidapi_key: Option<String>,
    /// Provider ids in fallback order.
    pub news_sources: Vec<String>,
    pub request_timeout: Duration,
    pub fallback_delay: Duration,
    pub max_consecutive_failures: u32,
    pub cooldown: Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub twitter: Option<XCredentials>,
    pub dry_run: bool,
    pub supabase: Option<SupabaseConfig>,
    pub store_path: String,
    pub rng_seed: Option<u64>,
    /// `None` disables the in-process scheduler.
    pub posting_interval: Option<Duration>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            rapidapi_key: None,
            news_sources: DEFAULT_NEWS_SOURCES.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_secs(15),
            fallback_delay: Duration::from_millis(1000),
            max_consecutive_failures: 5,
            cooldown: Duration::from_secs(300),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            twitter: None,
            dry_run: false,
            supabase: None,
            store_path: DEFAULT_STORE_PATH.to_string(),
            rng_seed: None,
            posting_interval: None,
        }
    }
}

impl BotConfig {
    /// Read configuration from process env. Missing or unparsable values take defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` but reads from an arbitrary lookup (tests, tooling).
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parse_u64 = |k: &str| non_empty(k).and_then(|v| v.parse::<u64>().ok());

        let news_sources = non_empty("NEWS_SOURCES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or(d.news_sources);

        let supabase = match (non_empty("SUPABASE_URL"), non_empty("SUPABASE_KEY")) {
            (Some(url), Some(key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                key,
                table: non_empty("SUPABASE_TABLE").unwrap_or_else(|| DEFAULT_SUPABASE_TABLE.into()),
            }),
            _ => None,
        };

        let twitter = match (
            non_empty("TWITTER_API_KEY"),
            non_empty("TWITTER_API_SECRET"),
            non_empty("TWITTER_ACCESS_TOKEN"),
            non_empty("TWITTER_ACCESS_TOKEN_SECRET"),
        ) {
            (Some(api_key), Some(api_secret), Some(access_token), Some(access_token_secret)) => {
                Some(XCredentials {
                    api_key,
                    api_secret,
                    access_token,
                    access_token_secret,
                })
            }
            _ => None,
        };

        Self {
            rapidapi_key: non_empty("RAPIDAPI_KEY"),
            news_sources,
            request_timeout: parse_u64("REQUEST_TIMEOUT_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(d.request_timeout),
            fallback_delay: parse_u64("FALLBACK_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(d.fallback_delay),
            max_consecutive_failures: parse_u64("MAX_CONSECUTIVE_FAILURES")
                .filter(|n| *n > 0)
                .map(|n| n.min(u32::MAX as u64) as u32)
                .unwrap_or(d.max_consecutive_failures),
            cooldown: parse_u64("COOLDOWN_SECS")
                .map(Duration::from_secs)
                .unwrap_or(d.cooldown),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(d.gemini_model),
            twitter,
            dry_run: non_empty("DRY_RUN")
                .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
            supabase,
            store_path: non_empty("STORE_PATH").unwrap_or(d.store_path),
            rng_seed: parse_u64("BOT_RNG_SEED"),
            posting_interval: parse_u64("POSTING_INTERVAL_MINUTES")
                .filter(|m| *m > 0)
                .map(|m| Duration::from_secs(m * 60)),
        }
    }
}
