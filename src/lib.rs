// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod bot;
pub mod config;
pub mod dedup;
pub mod metrics;
pub mod pacing;
pub mod scheduler;

// News pipeline: acquisition, then validation/scoring/selection
pub mod analyze;
pub mod ingest;

// Outbound collaborators
pub mod generate;
pub mod publish;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::bot::{CryptoBot, CycleOutcome, FailReason, SkipReason};
