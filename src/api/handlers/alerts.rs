use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::alert_repo;
use crate::errors::AppError;
use crate::models::alert::alert_status;
use crate::models::FraudAlert;
use crate::AppState;

use super::subscriptions::ApiResponse;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AlertsQuery {
    pub trader_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Alerts newest first, optionally filtered by trader and status.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<ApiResponse<Vec<FraudAlert>>>, AppError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let alerts = alert_repo::list_alerts(
        &state.db,
        query.trader_id,
        query.status.as_deref(),
        limit,
    )
    .await?;

    Ok(ApiResponse::ok(alerts))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FraudAlert>>, AppError> {
    let alert = alert_repo::get_alert(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("alert not found".into()))?;

    Ok(ApiResponse::ok(alert))
}

/// Move an alert through triage.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<ApiResponse<FraudAlert>>, AppError> {
    let valid = [
        alert_status::PENDING,
        alert_status::INVESTIGATING,
        alert_status::DISMISSED,
        alert_status::RESOLVED,
    ];
    if !valid.contains(&body.status.as_str()) {
        return Err(AppError::BadRequest(format!(
            "unknown alert status: {}",
            body.status
        )));
    }

    let alert = alert_repo::set_alert_status(&state.db, id, &body.status)
        .await?
        .ok_or_else(|| AppError::NotFound("alert not found".into()))?;

    tracing::info!(alert = %alert.id, status = %alert.status, "Alert status changed");

    Ok(ApiResponse::ok(alert))
}
