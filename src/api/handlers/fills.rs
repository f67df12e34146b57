use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CopyTrade, LeaderFill, Side};
use crate::AppState;

use super::subscriptions::ApiResponse;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// One executed leader trade, as delivered by the order-execution platform.
#[derive(Deserialize)]
pub struct LeaderFillRequest {
    pub trade_id: Uuid,
    pub trader_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub asset_class: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub counterparty_id: Option<Uuid>,
    /// Defaults to delivery time when the upstream omits it.
    pub executed_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CloseRequest {
    pub copy_trade_id: Uuid,
    pub exit_price: Decimal,
    /// Backfills the stored fee when the upstream settles it late.
    pub fee: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Fan a leader fill out to its followers.
pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<LeaderFillRequest>,
) -> Result<Json<ApiResponse<Vec<CopyTrade>>>, AppError> {
    let side = Side::from_api_str(&body.side)
        .ok_or_else(|| AppError::BadRequest(format!("unknown side: {}", body.side)))?;

    if body.quantity <= Decimal::ZERO || body.price <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "quantity and price must be positive".into(),
        ));
    }

    let fill = LeaderFill {
        trade_id: body.trade_id,
        trader_id: body.trader_id,
        symbol: body.symbol,
        side,
        asset_class: body.asset_class,
        quantity: body.quantity,
        price: body.price,
        counterparty_id: body.counterparty_id,
        executed_at: body.executed_at.unwrap_or_else(Utc::now),
    };

    let records = state.engine.process_leader_fill(&fill).await?;

    Ok(ApiResponse::ok(records))
}

/// Settle a filled copy trade against its exit price.
pub async fn close(
    State(state): State<AppState>,
    Json(body): Json<CloseRequest>,
) -> Result<Json<ApiResponse<CopyTrade>>, AppError> {
    if body.exit_price <= Decimal::ZERO {
        return Err(AppError::BadRequest("exit_price must be positive".into()));
    }
    if body.fee.is_some_and(|f| f < Decimal::ZERO) {
        return Err(AppError::BadRequest("fee cannot be negative".into()));
    }

    let closed = state
        .engine
        .close_copy_trade(body.copy_trade_id, body.exit_price, body.fee)
        .await?
        .ok_or_else(|| AppError::NotFound("no filled copy trade to close".into()))?;

    Ok(ApiResponse::ok(closed))
}
