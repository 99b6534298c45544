use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/", get(alive))
        .route("/healthz", get(healthz))
}

/// Uptime pings from hosting platforms hit the root path.
async fn alive() -> &'static str {
    "SigBot is alive!"
}

async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let uptime = (Utc::now() - state.started_at).num_seconds().max(0);
    Json(json!({
        "status": "ok",
        "subscriptions": state.subscriptions,
        "uptime_secs": uptime,
        "started_at": state.started_at.to_rfc3339(),
    }))
}
