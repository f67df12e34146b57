use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the trader_trades table (platform trade log).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TraderTrade {
    pub id: Uuid,
    pub trader_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub asset_class: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub counterparty_id: Option<Uuid>,
    pub executed_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TraderTrade {
    /// Notional value of the trade.
    pub fn trade_value(&self) -> Decimal {
        self.quantity * self.price
    }
}
