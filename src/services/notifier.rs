use serde_json::json;

use crate::models::{CopyTrade, FraudAlert};

/// Telegram notification service. Failures are logged but never block the main flow.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
        }
    }

    /// Send a Telegram message. Failures are logged as warnings.
    pub async fn send(&self, message: &str) {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    tracing::warn!(
                        status = %resp.status(),
                        "Telegram sendMessage returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send Telegram notification");
            }
        }
    }
}

/// Format a filled copy trade message.
pub fn format_copy_fill(trade: &CopyTrade) -> String {
    format!(
        "*Copy Trade Filled*\nSymbol: `{}`\nSide: {}\nQty: {} @ {}\nValue: ${}\nFee: ${}\nFollower: `{}`",
        trade.symbol,
        trade.side,
        trade.copy_quantity,
        trade.leader_price,
        trade.position_value().round_dp(2),
        trade.fee_amount.round_dp(4),
        trade.follower_id,
    )
}

/// Format a fraud alert message.
pub fn format_fraud_alert(alert: &FraudAlert) -> String {
    format!(
        "*Fraud Alert*\nTrader: `{}`\nType: {}\nSeverity: {}\nConfidence: {:.2}\n{}",
        alert.trader_id,
        alert.alert_type,
        alert.severity,
        alert.confidence,
        alert.description,
    )
}
