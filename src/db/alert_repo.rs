use sqlx::PgPool;
use uuid::Uuid;

use crate::models::FraudAlert;

/// The open (pending/investigating) alert for a (trader, type), if any.
pub async fn find_active_alert(
    pool: &PgPool,
    trader_id: Uuid,
    alert_type: &str,
) -> anyhow::Result<Option<FraudAlert>> {
    let row = sqlx::query_as::<_, FraudAlert>(
        r#"
        SELECT * FROM fraud_alerts
        WHERE trader_id = $1 AND alert_type = $2
          AND status IN ('pending', 'investigating')
        "#,
    )
    .bind(trader_id)
    .bind(alert_type)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Create a new alert in `pending` status.
pub async fn insert_alert(
    pool: &PgPool,
    trader_id: Uuid,
    alert_type: &str,
    severity: &str,
    confidence: f64,
    description: &str,
    evidence: &[String],
    related_trade_ids: &[Uuid],
) -> anyhow::Result<FraudAlert> {
    let row = sqlx::query_as::<_, FraudAlert>(
        r#"
        INSERT INTO fraud_alerts
            (trader_id, alert_type, severity, confidence, description, evidence, related_trade_ids)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(trader_id)
    .bind(alert_type)
    .bind(severity)
    .bind(confidence)
    .bind(description)
    .bind(evidence)
    .bind(related_trade_ids)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Merge a repeat detection into an open alert: confidence and severity are
/// already recomputed by the caller; evidence and trade ids are appended.
pub async fn merge_alert(
    pool: &PgPool,
    id: Uuid,
    confidence: f64,
    severity: &str,
    evidence: &[String],
    related_trade_ids: &[Uuid],
) -> anyhow::Result<FraudAlert> {
    let row = sqlx::query_as::<_, FraudAlert>(
        r#"
        UPDATE fraud_alerts
        SET confidence = $2,
            severity = $3,
            evidence = evidence || $4::text[],
            related_trade_ids = related_trade_ids || $5::uuid[],
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(confidence)
    .bind(severity)
    .bind(evidence)
    .bind(related_trade_ids)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch an alert by id.
pub async fn get_alert(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<FraudAlert>> {
    let row = sqlx::query_as::<_, FraudAlert>("SELECT * FROM fraud_alerts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// List alerts, optionally filtered by trader and status, newest first.
pub async fn list_alerts(
    pool: &PgPool,
    trader_id: Option<Uuid>,
    status: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<FraudAlert>> {
    let rows = sqlx::query_as::<_, FraudAlert>(
        r#"
        SELECT * FROM fraud_alerts
        WHERE ($1::uuid IS NULL OR trader_id = $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(trader_id)
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Move an alert through triage.
pub async fn set_alert_status(
    pool: &PgPool,
    id: Uuid,
    status: &str,
) -> anyhow::Result<Option<FraudAlert>> {
    let row = sqlx::query_as::<_, FraudAlert>(
        r#"
        UPDATE fraud_alerts
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
