use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use shuttle_axum::axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::bot::{CryptoBot, CycleOutcome};
use crate::publish::Publisher;
use crate::store::{cleanup_older_than_days, collect_stats, PostStore};

pub const DEFAULT_CLEANUP_DAYS: u32 = 30;
const RECENT_POSTS_LIMIT: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Mutex<CryptoBot>>,
    /// Same store the bot writes to; read paths don't wait for a running cycle.
    pub store: Arc<dyn PostStore>,
    pub publisher: Arc<dyn Publisher>,
}

impl AppState {
    pub fn new(bot: CryptoBot) -> Self {
        let store = bot.store().clone();
        let publisher = bot.publisher().clone();
        Self {
            bot: Arc::new(Mutex::new(bot)),
            store,
            publisher,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/database/health", get(database_health))
        .route("/run", get(run).post(run))
        .route("/stats", get(stats))
        .route("/cleanup", post(cleanup))
        .route("/diagnostics", get(diagnostics))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

async fn home(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "active",
        "service": "crypto-news-bot",
        "database": state.store.backend(),
        "timestamp": now_iso(),
        "endpoints": {
            "health": "/health",
            "run": "/run",
            "stats": "/stats",
            "database": "/database/health",
            "cleanup": "/cleanup",
            "diagnostics": "/diagnostics",
        }
    }))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let publisher_ok = state.publisher.verify_credentials().await;
    let db = state.store.health().await;
    let stats = collect_stats(state.store.as_ref(), chrono::Utc::now()).await;

    let (code, status) = if db.is_healthy() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };
    (
        code,
        Json(json!({
            "status": status,
            "x_api": if publisher_ok { "connected" } else { "disconnected" },
            "publisher": state.publisher.name(),
            "database": db,
            "statistics": {
                "total_posts": stats.total_posts,
                "today_posts": stats.today_posts,
            },
            "timestamp": now_iso(),
        })),
    )
}

async fn database_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let h = state.store.health().await;
    let code = if h.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(json!(h)))
}

async fn run(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    tracing::info!("bot cycle requested via api");
    let outcome = state.bot.lock().await.run_cycle().await;

    let code = match outcome {
        CycleOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };
    let mut body = json!({
        "status": outcome.status(),
        "outcome": outcome.label(),
        "message": outcome.message(),
        "database": state.store.backend(),
        "timestamp": now_iso(),
    });
    if let CycleOutcome::Posted(p) = &outcome {
        body["post"] = json!(p);
    }
    (code, Json(body))
}

async fn stats(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let stats = collect_stats(state.store.as_ref(), chrono::Utc::now()).await;
    match state.store.list_recent(RECENT_POSTS_LIMIT).await {
        Ok(recent) => (
            StatusCode::OK,
            Json(json!({
                "database": state.store.backend(),
                "statistics": stats,
                "recent_posts": recent,
                "timestamp": now_iso(),
            })),
        ),
        Err(e) => {
            tracing::error!(error = ?e, "listing recent posts failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{e:#}"), "database": state.store.backend() })),
            )
        }
    }
}

#[derive(Deserialize, Default)]
struct CleanupReq {
    #[serde(default)]
    days: Option<u32>,
}

async fn cleanup(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    // Empty body means the default retention.
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CleanupReq::default()
    } else {
        match serde_json::from_slice::<CleanupReq>(&body) {
            Ok(r) => r,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid cleanup request: {e}") })),
                )
            }
        }
    };
    let days = req.days.unwrap_or(DEFAULT_CLEANUP_DAYS);

    match cleanup_older_than_days(state.store.as_ref(), days, chrono::Utc::now()).await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "deleted": deleted,
                "days": days,
                "message": format!("Cleaned up {deleted} records older than {days} days"),
                "database": state.store.backend(),
            })),
        ),
        Err(e) => {
            tracing::error!(error = ?e, days, "cleanup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{e:#}") })),
            )
        }
    }
}

async fn diagnostics(State(state): State<AppState>) -> Json<Value> {
    let report = state.bot.lock().await.probe_services().await;
    Json(json!({
        "services": report,
        "timestamp": now_iso(),
    }))
}
