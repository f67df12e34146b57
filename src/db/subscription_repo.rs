use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::subscription::NewSubscription;
use crate::models::CopySubscription;

/// Insert a new subscription in `active` status.
pub async fn insert_subscription(
    pool: &PgPool,
    sub: &NewSubscription,
) -> anyhow::Result<CopySubscription> {
    let row = sqlx::query_as::<_, CopySubscription>(
        r#"
        INSERT INTO copy_subscriptions
            (follower_id, leader_id, sizing_mode, fixed_amount, portfolio_pct, copy_ratio,
             max_position_size, max_daily_loss, max_total_exposure,
             copy_asset_classes, excluded_symbols, copy_delay_seconds, expires_at, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'active')
        RETURNING *
        "#,
    )
    .bind(sub.follower_id)
    .bind(sub.leader_id)
    .bind(sub.sizing_mode.as_str())
    .bind(sub.fixed_amount)
    .bind(sub.portfolio_pct)
    .bind(sub.copy_ratio)
    .bind(sub.max_position_size)
    .bind(sub.max_daily_loss)
    .bind(sub.max_total_exposure)
    .bind(&sub.copy_asset_classes)
    .bind(&sub.excluded_symbols)
    .bind(sub.copy_delay_seconds)
    .bind(sub.expires_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a subscription by id.
pub async fn get_subscription(
    pool: &PgPool,
    id: Uuid,
) -> anyhow::Result<Option<CopySubscription>> {
    let row = sqlx::query_as::<_, CopySubscription>(
        "SELECT * FROM copy_subscriptions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All subscriptions for a follower, newest first.
pub async fn get_subscriptions_by_follower(
    pool: &PgPool,
    follower_id: Uuid,
) -> anyhow::Result<Vec<CopySubscription>> {
    let rows = sqlx::query_as::<_, CopySubscription>(
        "SELECT * FROM copy_subscriptions WHERE follower_id = $1 ORDER BY created_at DESC",
    )
    .bind(follower_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Active, unexpired subscriptions to one leader (the fan-out set).
pub async fn get_active_subscriptions_for_leader(
    pool: &PgPool,
    leader_id: Uuid,
) -> anyhow::Result<Vec<CopySubscription>> {
    let rows = sqlx::query_as::<_, CopySubscription>(
        r#"
        SELECT * FROM copy_subscriptions
        WHERE leader_id = $1
          AND status = 'active'
          AND (expires_at IS NULL OR expires_at > NOW())
        ORDER BY created_at
        "#,
    )
    .bind(leader_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The live (pending/active/paused) subscription for a pair, if any.
pub async fn find_live_pair(
    pool: &PgPool,
    follower_id: Uuid,
    leader_id: Uuid,
) -> anyhow::Result<Option<CopySubscription>> {
    let row = sqlx::query_as::<_, CopySubscription>(
        r#"
        SELECT * FROM copy_subscriptions
        WHERE follower_id = $1 AND leader_id = $2
          AND status IN ('pending', 'active', 'paused')
        "#,
    )
    .bind(follower_id)
    .bind(leader_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Count a follower's live subscriptions.
pub async fn count_live_subscriptions(pool: &PgPool, follower_id: Uuid) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM copy_subscriptions
        WHERE follower_id = $1 AND status IN ('pending', 'active', 'paused')
        "#,
    )
    .bind(follower_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Number of active subscriptions platform-wide, for the ops gauge.
pub async fn count_active_subscriptions(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM copy_subscriptions WHERE status = 'active'")
            .fetch_one(pool)
            .await?;

    Ok(row.0)
}

/// Replace the tunable settings on a subscription.
pub async fn update_settings(
    pool: &PgPool,
    id: Uuid,
    sub: &NewSubscription,
) -> anyhow::Result<CopySubscription> {
    let row = sqlx::query_as::<_, CopySubscription>(
        r#"
        UPDATE copy_subscriptions
        SET sizing_mode = $2,
            fixed_amount = $3,
            portfolio_pct = $4,
            copy_ratio = $5,
            max_position_size = $6,
            max_daily_loss = $7,
            max_total_exposure = $8,
            copy_asset_classes = $9,
            excluded_symbols = $10,
            copy_delay_seconds = $11,
            expires_at = $12,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(sub.sizing_mode.as_str())
    .bind(sub.fixed_amount)
    .bind(sub.portfolio_pct)
    .bind(sub.copy_ratio)
    .bind(sub.max_position_size)
    .bind(sub.max_daily_loss)
    .bind(sub.max_total_exposure)
    .bind(&sub.copy_asset_classes)
    .bind(&sub.excluded_symbols)
    .bind(sub.copy_delay_seconds)
    .bind(sub.expires_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Set the lifecycle status.
pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    status: &str,
) -> anyhow::Result<CopySubscription> {
    let row = sqlx::query_as::<_, CopySubscription>(
        r#"
        UPDATE copy_subscriptions
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Bump running totals after a copy trade fills. Fill path only; skips and
/// failures leave the totals untouched.
pub async fn record_fill_totals(pool: &PgPool, id: Uuid, fee: Decimal) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE copy_subscriptions
        SET total_copied_trades = total_copied_trades + 1,
            total_fees_paid = total_fees_paid + $2,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(fee)
    .execute(pool)
    .await?;

    Ok(())
}

/// Lapse every live subscription whose expiry has passed. Returns the number
/// of rows transitioned.
pub async fn expire_due_subscriptions(pool: &PgPool) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE copy_subscriptions
        SET status = 'expired', updated_at = NOW()
        WHERE status IN ('pending', 'active', 'paused')
          AND expires_at IS NOT NULL
          AND expires_at <= NOW()
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
