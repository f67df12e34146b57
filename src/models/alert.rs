use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Alert type / severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    WashTrading,
    Manipulation,
    BotBehavior,
    UnusualActivity,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::WashTrading => "wash_trading",
            AlertType::Manipulation => "manipulation",
            AlertType::BotBehavior => "bot_behavior",
            AlertType::UnusualActivity => "unusual_activity",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Severity band for a detection confidence in [0, 1].
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            AlertSeverity::Critical
        } else if confidence >= 0.7 {
            AlertSeverity::High
        } else if confidence >= 0.5 {
            AlertSeverity::Medium
        } else {
            AlertSeverity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert triage status constants.
pub mod alert_status {
    pub const PENDING: &str = "pending";
    pub const INVESTIGATING: &str = "investigating";
    pub const DISMISSED: &str = "dismissed";
    pub const RESOLVED: &str = "resolved";
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// Database row for the fraud_alerts table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FraudAlert {
    pub id: Uuid,
    pub trader_id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub confidence: f64,
    pub description: String,
    pub evidence: Vec<String>,
    pub related_trade_ids: Vec<Uuid>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
