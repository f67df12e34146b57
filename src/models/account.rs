use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the accounts table.
///
/// `total_exposure` is the running value of open copied positions; the copy
/// engine bumps it on fill and the closes endpoint releases it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub available_balance: Decimal,
    pub portfolio_value: Decimal,
    pub total_exposure: Decimal,
    pub fraud_risk_score: f64,
    pub suspicious_activity_count: i32,
    pub alpha_score: Option<f64>,
    pub luck_score: Option<f64>,
    pub skill_score: Option<f64>,
    pub manipulation_score: Option<f64>,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
