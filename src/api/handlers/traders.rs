use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::AnalysisReport;
use crate::db::account_repo;
use crate::errors::{AppError, FraudDetectionError};
use crate::AppState;

use super::subscriptions::ApiResponse;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Reputation-facing slice of an account; balances stay private.
#[derive(Serialize)]
pub struct RiskProfile {
    pub user_id: Uuid,
    pub fraud_risk_score: f64,
    pub suspicious_activity_count: i32,
    pub alpha_score: Option<f64>,
    pub luck_score: Option<f64>,
    pub skill_score: Option<f64>,
    pub manipulation_score: Option<f64>,
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn risk(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RiskProfile>>, AppError> {
    let account = account_repo::get_account(&state.db, id)
        .await?
        .ok_or(FraudDetectionError::TraderNotFound)?;

    Ok(ApiResponse::ok(RiskProfile {
        user_id: account.user_id,
        fraud_risk_score: account.fraud_risk_score,
        suspicious_activity_count: account.suspicious_activity_count,
        alpha_score: account.alpha_score,
        luck_score: account.luck_score,
        skill_score: account.skill_score,
        manipulation_score: account.manipulation_score,
        last_analyzed_at: account.last_analyzed_at,
    }))
}

/// Run the pattern analysis for one trader on demand.
pub async fn analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AnalysisReport>>, AppError> {
    let report = state.analyzer.analyze_trader(id).await?;

    Ok(ApiResponse::ok(report))
}
