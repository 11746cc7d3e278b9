// src/scheduler.rs
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::bot::CryptoBot;

/// Run one bot cycle every `every`, first one after a full interval.
/// Shares the bot lock with `/run`, so cycles never overlap.
pub fn spawn_cycle_scheduler(bot: Arc<Mutex<CryptoBot>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + every;
        let mut ticker = tokio::time::interval_at(start, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(interval_secs = every.as_secs(), "cycle scheduler started");
        loop {
            ticker.tick().await;
            let outcome = bot.lock().await.run_cycle().await;

            counter!("bot_scheduled_runs_total").increment(1);
            gauge!("bot_last_scheduled_run_ts").set(chrono::Utc::now().timestamp() as f64);

            tracing::info!(status = outcome.status(), outcome = outcome.label(), "scheduled cycle");
        }
    })
}
