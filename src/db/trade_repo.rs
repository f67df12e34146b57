use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{LeaderFill, TraderTrade};

/// Record a leader fill in the platform trade log.
///
/// `id` is the upstream execution id; a replayed notification lands on the
/// existing row and returns it unchanged.
pub async fn record_fill(pool: &PgPool, fill: &LeaderFill) -> anyhow::Result<TraderTrade> {
    let trade = sqlx::query_as::<_, TraderTrade>(
        r#"
        INSERT INTO trader_trades
            (id, trader_id, symbol, side, asset_class, quantity, price, counterparty_id, executed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET id = trader_trades.id
        RETURNING *
        "#,
    )
    .bind(fill.trade_id)
    .bind(fill.trader_id)
    .bind(&fill.symbol)
    .bind(fill.side.as_str())
    .bind(&fill.asset_class)
    .bind(fill.quantity)
    .bind(fill.price)
    .bind(fill.counterparty_id)
    .bind(fill.executed_at)
    .fetch_one(pool)
    .await?;

    Ok(trade)
}

/// Trades for one analysis window, time-ascending. When the window holds
/// more than `limit` trades the most recent ones win.
pub async fn get_analysis_window(
    pool: &PgPool,
    trader_id: Uuid,
    since: DateTime<Utc>,
    limit: i64,
) -> anyhow::Result<Vec<TraderTrade>> {
    let trades = sqlx::query_as::<_, TraderTrade>(
        r#"
        SELECT * FROM (
            SELECT * FROM trader_trades
            WHERE trader_id = $1 AND executed_at >= $2
            ORDER BY executed_at DESC
            LIMIT $3
        ) recent
        ORDER BY executed_at ASC
        "#,
    )
    .bind(trader_id)
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

/// Distinct traders with at least one trade since `since`, for the sweep.
pub async fn get_active_trader_ids(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT DISTINCT trader_id FROM trader_trades WHERE executed_at >= $1",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Count trades for a trader since `since`.
pub async fn count_trades_since(
    pool: &PgPool,
    trader_id: Uuid,
    since: DateTime<Utc>,
) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM trader_trades WHERE trader_id = $1 AND executed_at >= $2",
    )
    .bind(trader_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
