// tests/scheduler.rs
//
// In-process trigger on a paused clock.

mod common;

use common::{Harness, StubProvider};
use crypto_news_bot::scheduler::spawn_cycle_scheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[tokio::test(start_paused = true)]
async fn runs_one_cycle_per_interval_after_first_period() {
    let h = Harness::new();
    let provider = StubProvider::empty("coingecko");
    let bot = Arc::new(Mutex::new(h.bot(vec![provider.clone()])));

    let handle = spawn_cycle_scheduler(bot.clone(), Duration::from_secs(60));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(bot.lock().await.consecutive_failures(), 0, "no cycle before the first period");

    tokio::time::sleep(Duration::from_secs(100)).await;
    // ticks at 60s and 120s
    assert_eq!(bot.lock().await.consecutive_failures(), 2);
    // first pick + fallback pass per cycle
    assert_eq!(provider.calls(), 4);

    handle.abort();
}
