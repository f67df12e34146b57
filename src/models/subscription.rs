use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// How a follower's copy quantity is derived from the leader's fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    FixedAmount,
    PercentagePortfolio,
    Proportional,
    FixedRatio,
}

impl SizingMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fixed_amount" => Some(SizingMode::FixedAmount),
            "percentage_portfolio" => Some(SizingMode::PercentagePortfolio),
            "proportional" => Some(SizingMode::Proportional),
            "fixed_ratio" => Some(SizingMode::FixedRatio),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizingMode::FixedAmount => "fixed_amount",
            SizingMode::PercentagePortfolio => "percentage_portfolio",
            SizingMode::Proportional => "proportional",
            SizingMode::FixedRatio => "fixed_ratio",
        }
    }
}

impl fmt::Display for SizingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription status constants.
pub mod subscription_status {
    pub const PENDING: &str = "pending";
    pub const ACTIVE: &str = "active";
    pub const PAUSED: &str = "paused";
    pub const CANCELLED: &str = "cancelled";
    pub const EXPIRED: &str = "expired";
}

/// Database row for the copy_subscriptions table.
///
/// Exactly one of `fixed_amount` / `portfolio_pct` / `copy_ratio` is
/// meaningful, selected by `sizing_mode`; proportional carries none.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CopySubscription {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub leader_id: Uuid,
    pub sizing_mode: String,
    pub fixed_amount: Option<Decimal>,
    pub portfolio_pct: Option<Decimal>,
    pub copy_ratio: Option<Decimal>,
    pub max_position_size: Decimal,
    pub max_daily_loss: Decimal,
    pub max_total_exposure: Decimal,
    pub copy_asset_classes: Vec<String>,
    pub excluded_symbols: Vec<String>,
    pub copy_delay_seconds: i32,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub total_copied_trades: i32,
    pub total_fees_paid: Decimal,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CopySubscription {
    pub fn is_active(&self) -> bool {
        self.status == subscription_status::ACTIVE
    }

    pub fn is_terminal(&self) -> bool {
        self.status == subscription_status::CANCELLED || self.status == subscription_status::EXPIRED
    }
}

/// A validated subscription ready for insertion.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub follower_id: Uuid,
    pub leader_id: Uuid,
    pub sizing_mode: SizingMode,
    pub fixed_amount: Option<Decimal>,
    pub portfolio_pct: Option<Decimal>,
    pub copy_ratio: Option<Decimal>,
    pub max_position_size: Decimal,
    pub max_daily_loss: Decimal,
    pub max_total_exposure: Decimal,
    pub copy_asset_classes: Vec<String>,
    pub excluded_symbols: Vec<String>,
    pub copy_delay_seconds: i32,
    pub expires_at: Option<DateTime<Utc>>,
}
