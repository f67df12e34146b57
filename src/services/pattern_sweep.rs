use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::analysis::PatternAnalyzer;
use crate::db::trade_repo;
use crate::errors::{AppError, FraudDetectionError};
use crate::services::notifier::{self, Notifier};

/// Run the pattern sweep loop. Each pass re-analyzes every trader who has
/// traded inside the analysis window; traders with too little history are
/// skipped quietly.
pub async fn run_pattern_sweep(
    pool: PgPool,
    analyzer: PatternAnalyzer,
    notify: Option<Arc<Notifier>>,
    sweep_interval_secs: u64,
    window_days: i64,
) {
    let mut ticker = interval(Duration::from_secs(sweep_interval_secs));
    tracing::info!(interval_secs = sweep_interval_secs, "Pattern sweep started");

    loop {
        ticker.tick().await;

        let since = Utc::now() - chrono::Duration::days(window_days);
        let traders = match trade_repo::get_active_trader_ids(&pool, since).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "Pattern sweep: failed to list active traders");
                continue;
            }
        };

        if traders.is_empty() {
            continue;
        }

        tracing::debug!(count = traders.len(), "Pattern sweep: analyzing traders");

        for trader_id in traders {
            match analyzer.analyze_trader(trader_id).await {
                Ok(report) => {
                    if let Some(n) = &notify {
                        for alert in &report.alerts {
                            if matches!(alert.severity.as_str(), "high" | "critical") {
                                n.send(&notifier::format_fraud_alert(alert)).await;
                            }
                        }
                    }
                }
                Err(AppError::Fraud(FraudDetectionError::InsufficientData { trades, min })) => {
                    tracing::debug!(
                        trader_id = %trader_id,
                        trades,
                        min,
                        "Pattern sweep: not enough history"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        trader_id = %trader_id,
                        "Pattern sweep: analysis failed"
                    );
                }
            }
        }
    }
}
