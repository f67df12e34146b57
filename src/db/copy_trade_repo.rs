use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::copy_trade::NewCopyTrade;
use crate::models::CopyTrade;

/// Insert a replication attempt. The unique (subscription_id, leader_trade_id)
/// index rejects a second attempt for the same pair.
pub async fn insert_copy_trade(pool: &PgPool, new: &NewCopyTrade) -> anyhow::Result<CopyTrade> {
    let row = sqlx::query_as::<_, CopyTrade>(
        r#"
        INSERT INTO copy_trades
            (subscription_id, leader_trade_id, follower_id, leader_id,
             symbol, side, asset_class, leader_quantity, leader_price, copy_quantity,
             status, reason, client_order_id, execute_after)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(new.subscription_id)
    .bind(new.leader_trade_id)
    .bind(new.follower_id)
    .bind(new.leader_id)
    .bind(&new.symbol)
    .bind(&new.side)
    .bind(&new.asset_class)
    .bind(new.leader_quantity)
    .bind(new.leader_price)
    .bind(new.copy_quantity)
    .bind(&new.status)
    .bind(&new.reason)
    .bind(&new.client_order_id)
    .bind(new.execute_after)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a copy trade by id.
pub async fn get_copy_trade(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<CopyTrade>> {
    let row = sqlx::query_as::<_, CopyTrade>("SELECT * FROM copy_trades WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// All replication records spawned by one leader trade.
pub async fn get_by_leader_trade(
    pool: &PgPool,
    leader_trade_id: Uuid,
) -> anyhow::Result<Vec<CopyTrade>> {
    let rows = sqlx::query_as::<_, CopyTrade>(
        "SELECT * FROM copy_trades WHERE leader_trade_id = $1 ORDER BY created_at",
    )
    .bind(leader_trade_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Copy trades for one subscription, newest first.
pub async fn get_for_subscription(
    pool: &PgPool,
    subscription_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<CopyTrade>> {
    let rows = sqlx::query_as::<_, CopyTrade>(
        r#"
        SELECT * FROM copy_trades
        WHERE subscription_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(subscription_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Delayed trades whose execute_after has passed.
pub async fn get_due_delayed(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<CopyTrade>> {
    let rows = sqlx::query_as::<_, CopyTrade>(
        r#"
        SELECT * FROM copy_trades
        WHERE status = 'pending'
          AND execute_after IS NOT NULL
          AND execute_after <= NOW()
        ORDER BY execute_after
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Claim a pending trade for execution. Returns None when another worker got
/// there first or the trade already left `pending`.
pub async fn claim_pending(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<CopyTrade>> {
    let row = sqlx::query_as::<_, CopyTrade>(
        r#"
        UPDATE copy_trades
        SET status = 'executing', updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Record the placed order and fee, terminal `filled`.
pub async fn mark_filled(
    pool: &PgPool,
    id: Uuid,
    order_id: &str,
    fee: Decimal,
) -> anyhow::Result<CopyTrade> {
    let row = sqlx::query_as::<_, CopyTrade>(
        r#"
        UPDATE copy_trades
        SET status = 'filled',
            order_id = $2,
            fee_amount = $3,
            executed_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(order_id)
    .bind(fee)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Terminal `failed` with the caught gateway message.
pub async fn mark_failed(pool: &PgPool, id: Uuid, message: &str) -> anyhow::Result<CopyTrade> {
    let row = sqlx::query_as::<_, CopyTrade>(
        r#"
        UPDATE copy_trades
        SET status = 'failed', reason = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(message)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Cancel a still-pending delayed trade (subscription no longer active).
/// Returns None when the trade already left `pending`.
pub async fn cancel_if_pending(
    pool: &PgPool,
    id: Uuid,
    reason: &str,
) -> anyhow::Result<Option<CopyTrade>> {
    let row = sqlx::query_as::<_, CopyTrade>(
        r#"
        UPDATE copy_trades
        SET status = 'cancelled', reason = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(reason)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Sum of realized P&L on copy trades closed today (UTC day) for one
/// subscription. Feeds the daily-loss gate.
pub async fn sum_daily_realized_pnl(
    pool: &PgPool,
    subscription_id: Uuid,
) -> anyhow::Result<Decimal> {
    let row: (Decimal,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(realized_pnl), 0)
        FROM copy_trades
        WHERE subscription_id = $1
          AND closed_at >= date_trunc('day', NOW())
        "#,
    )
    .bind(subscription_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Close a filled copy trade: record realized P&L and optionally backfill the
/// fee. Returns None when the trade is missing, not `filled`, or already
/// closed, so a replayed close cannot rewrite the settled row.
pub async fn close_trade(
    pool: &PgPool,
    id: Uuid,
    realized_pnl: Decimal,
    fee: Option<Decimal>,
) -> anyhow::Result<Option<CopyTrade>> {
    let row = sqlx::query_as::<_, CopyTrade>(
        r#"
        UPDATE copy_trades
        SET realized_pnl = $2,
            fee_amount = COALESCE($3, fee_amount),
            closed_at = NOW(),
            updated_at = NOW()
        WHERE id = $1 AND status = 'filled' AND closed_at IS NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(realized_pnl)
    .bind(fee)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
