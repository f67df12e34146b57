use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Account;

/// Insert an account row if missing, otherwise return the existing one.
pub async fn upsert_account(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Account> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(account)
}

/// Fetch an account by user id.
pub async fn get_account(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(account)
}

/// Bump the follower's open-position exposure after a fill.
pub async fn add_exposure(pool: &PgPool, user_id: Uuid, value: Decimal) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET total_exposure = total_exposure + $2,
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Release exposure when a copied position closes. Floors at zero so a
/// replayed close cannot drive the counter negative.
pub async fn release_exposure(pool: &PgPool, user_id: Uuid, value: Decimal) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET total_exposure = GREATEST(total_exposure - $2, 0),
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Push the stored fraud-risk score up to `candidate` (never down) and count
/// one more suspicious-activity event.
pub async fn raise_fraud_risk(pool: &PgPool, user_id: Uuid, candidate: f64) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET fraud_risk_score = GREATEST(fraud_risk_score, $2),
            suspicious_activity_count = suspicious_activity_count + 1,
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(candidate)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist the scores from the latest analysis run.
pub async fn update_pattern_scores(
    pool: &PgPool,
    user_id: Uuid,
    alpha: f64,
    luck: f64,
    skill: f64,
    manipulation: f64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET alpha_score = $2,
            luck_score = $3,
            skill_score = $4,
            manipulation_score = $5,
            last_analyzed_at = NOW(),
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(alpha)
    .bind(luck)
    .bind(skill)
    .bind(manipulation)
    .execute(pool)
    .await?;

    Ok(())
}
