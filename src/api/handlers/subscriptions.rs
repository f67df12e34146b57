use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{copy_trade_repo, subscription_repo};
use crate::errors::{AppError, CopyTradingError};
use crate::execution::subscriptions::{
    self, CreateSubscriptionRequest, SubscriptionSettings,
};
use crate::models::{CopySubscription, CopyTrade};
use crate::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TradesQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub follower_id: Uuid,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateSubscriptionRequest>,
) -> Result<Json<ApiResponse<CopySubscription>>, AppError> {
    let sub =
        subscriptions::create_subscription(&state.db, &state.config.platform, &body).await?;

    Ok(ApiResponse::ok(sub))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CopySubscription>>, AppError> {
    let sub = subscription_repo::get_subscription(&state.db, id)
        .await?
        .ok_or(CopyTradingError::NotFound)?;

    Ok(ApiResponse::ok(sub))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SubscriptionSettings>,
) -> Result<Json<ApiResponse<CopySubscription>>, AppError> {
    let sub = subscriptions::update_subscription(&state.db, id, &body).await?;

    Ok(ApiResponse::ok(sub))
}

pub async fn pause(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CopySubscription>>, AppError> {
    let sub = subscriptions::pause_subscription(&state.db, id).await?;

    Ok(ApiResponse::ok(sub))
}

pub async fn resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CopySubscription>>, AppError> {
    let sub = subscriptions::resume_subscription(&state.db, id).await?;

    Ok(ApiResponse::ok(sub))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CopySubscription>>, AppError> {
    let sub = subscriptions::cancel_subscription(&state.db, id).await?;

    Ok(ApiResponse::ok(sub))
}

/// Replication history of one subscription, newest first.
pub async fn trades(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TradesQuery>,
) -> Result<Json<ApiResponse<Vec<CopyTrade>>>, AppError> {
    if subscription_repo::get_subscription(&state.db, id).await?.is_none() {
        return Err(CopyTradingError::NotFound.into());
    }

    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let trades = copy_trade_repo::get_for_subscription(&state.db, id, limit).await?;

    Ok(ApiResponse::ok(trades))
}

/// All subscriptions of one follower, any status, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<CopySubscription>>>, AppError> {
    let subs =
        subscription_repo::get_subscriptions_by_follower(&state.db, query.follower_id).await?;

    Ok(ApiResponse::ok(subs))
}
