use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the copy_trades table: one replication attempt per
/// (subscription, leader trade).
///
/// `leader_quantity` / `leader_price` / `copy_quantity` are frozen at
/// decision time and never recomputed, including for delayed trades.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CopyTrade {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub leader_trade_id: Uuid,
    pub follower_id: Uuid,
    pub leader_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub asset_class: String,
    pub leader_quantity: Decimal,
    pub leader_price: Decimal,
    pub copy_quantity: Decimal,
    pub status: String,
    pub reason: Option<String>,
    pub order_id: Option<String>,
    pub client_order_id: String,
    pub fee_amount: Decimal,
    pub execute_after: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub realized_pnl: Option<Decimal>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CopyTrade {
    /// Notional value the fill would add to the follower's exposure.
    pub fn position_value(&self) -> Decimal {
        self.copy_quantity * self.leader_price
    }
}

/// Copy trade status constants.
pub mod copy_trade_status {
    pub const PENDING: &str = "pending";
    pub const EXECUTING: &str = "executing";
    pub const FILLED: &str = "filled";
    pub const SKIPPED: &str = "skipped";
    pub const FAILED: &str = "failed";
    pub const CANCELLED: &str = "cancelled";
}

/// A sized replication decision ready for insertion.
#[derive(Debug, Clone)]
pub struct NewCopyTrade {
    pub subscription_id: Uuid,
    pub leader_trade_id: Uuid,
    pub follower_id: Uuid,
    pub leader_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub asset_class: String,
    pub leader_quantity: Decimal,
    pub leader_price: Decimal,
    pub copy_quantity: Decimal,
    pub status: String,
    pub reason: Option<String>,
    pub client_order_id: String,
    pub execute_after: Option<DateTime<Utc>>,
}
