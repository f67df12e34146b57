use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// Pause replication. Leader fills are still logged while paused.
pub async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    state.pause_flag.store(true, Ordering::Relaxed);
    tracing::warn!("Copy engine PAUSED via control API");
    (StatusCode::OK, Json(json!({ "status": "paused" })))
}

pub async fn resume(State(state): State<AppState>) -> impl IntoResponse {
    state.pause_flag.store(false, Ordering::Relaxed);
    tracing::info!("Copy engine RESUMED via control API");
    (StatusCode::OK, Json(json!({ "status": "running" })))
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let paused = state.pause_flag.load(Ordering::Relaxed);
    let mode = if state.config.gateway_url.is_some() {
        "live"
    } else {
        "simulated"
    };

    Json(json!({
        "mode": mode,
        "paused": paused,
        "telegram": state.config.has_telegram(),
    }))
}
