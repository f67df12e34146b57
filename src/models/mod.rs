pub mod account;
pub mod alert;
pub mod analysis;
pub mod copy_trade;
pub mod subscription;
pub mod trade;

pub use account::Account;
pub use alert::{AlertSeverity, AlertType, FraudAlert};
pub use analysis::{PatternScores, TradingPatternFeatures};
pub use copy_trade::CopyTrade;
pub use subscription::{CopySubscription, SizingMode};
pub use trade::TraderTrade;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LeaderFill: the fan-out input
// ---------------------------------------------------------------------------

/// An executed leader trade as reported by the upstream order-execution
/// system. `trade_id` is the upstream execution id and doubles as the
/// replay-dedup key for the trade log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderFill {
    pub trade_id: Uuid,
    pub trader_id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub asset_class: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub counterparty_id: Option<Uuid>,
    pub executed_at: DateTime<Utc>,
}

impl fmt::Display for LeaderFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fill: trade={} trader={} {} {} {} @ {}",
            self.trade_id, self.trader_id, self.side, self.quantity, self.symbol, self.price,
        )
    }
}
