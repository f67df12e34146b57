use std::time::Instant;

use chrono::{Duration, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::analysis::{features, scoring};
use crate::config::PlatformConfig;
use crate::db::{account_repo, alert_repo, trade_repo};
use crate::errors::{AppError, FraudDetectionError};
use crate::models::{
    AlertSeverity, AlertType, FraudAlert, PatternScores, TraderTrade, TradingPatternFeatures,
};

/// Minimum window size for the wash-trading check.
const WASH_TRADING_MIN_TRADES: usize = 10;

/// Everything one analysis run produced for a trader.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub trader_id: Uuid,
    pub features: TradingPatternFeatures,
    pub scores: PatternScores,
    pub alerts: Vec<FraudAlert>,
}

/// One fired check, before it is reconciled against open alerts.
#[derive(Debug)]
struct Finding {
    alert_type: AlertType,
    confidence: f64,
    description: String,
    evidence: Vec<String>,
    related_trade_ids: Vec<Uuid>,
}

/// Scores one trader's recent window for manipulation risk.
///
/// A run extracts features, computes the composite scores, upserts any
/// fired alerts, and writes the scores back to the account row.
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    pool: PgPool,
    platform: PlatformConfig,
}

impl PatternAnalyzer {
    pub fn new(pool: PgPool, platform: PlatformConfig) -> Self {
        Self { pool, platform }
    }

    pub async fn analyze_trader(&self, trader_id: Uuid) -> Result<AnalysisReport, AppError> {
        let started = Instant::now();

        if account_repo::get_account(&self.pool, trader_id).await?.is_none() {
            return Err(FraudDetectionError::TraderNotFound.into());
        }

        let since = Utc::now() - Duration::days(self.platform.analysis_window_days);
        let trades = trade_repo::get_analysis_window(
            &self.pool,
            trader_id,
            since,
            self.platform.analysis_max_trades,
        )
        .await?;

        let min = self.platform.analysis_min_trades;
        if trades.len() < min {
            return Err(FraudDetectionError::InsufficientData {
                trades: trades.len(),
                min,
            }
            .into());
        }

        let features = features::extract_features(trader_id, &trades);
        let scores = scoring::score_patterns(&features);

        let mut alerts = Vec::new();
        for finding in run_checks(trader_id, &features, &scores, &trades) {
            let alert = self.upsert_alert(trader_id, finding).await?;
            alerts.push(alert);
        }

        account_repo::update_pattern_scores(
            &self.pool,
            trader_id,
            scores.alpha,
            scores.luck,
            scores.skill,
            scores.manipulation,
        )
        .await?;

        histogram!("analysis_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            trader_id = %trader_id,
            trades = features.total_trades,
            manipulation = scores.manipulation,
            alerts = alerts.len(),
            "Pattern analysis complete"
        );

        Ok(AnalysisReport {
            trader_id,
            features,
            scores,
            alerts,
        })
    }

    /// Create the alert, or fold a repeat detection into the open one.
    ///
    /// Each alert event also pushes the trader's fraud risk score up to
    /// `confidence x 100` and ticks the suspicious-activity counter once.
    async fn upsert_alert(&self, trader_id: Uuid, finding: Finding) -> Result<FraudAlert, AppError> {
        let open =
            alert_repo::find_active_alert(&self.pool, trader_id, finding.alert_type.as_str())
                .await?;

        let alert = match open {
            Some(open) => {
                let confidence = open.confidence.max(finding.confidence);
                let severity = AlertSeverity::from_confidence(confidence);
                alert_repo::merge_alert(
                    &self.pool,
                    open.id,
                    confidence,
                    severity.as_str(),
                    &finding.evidence,
                    &finding.related_trade_ids,
                )
                .await?
            }
            None => {
                let severity = AlertSeverity::from_confidence(finding.confidence);
                alert_repo::insert_alert(
                    &self.pool,
                    trader_id,
                    finding.alert_type.as_str(),
                    severity.as_str(),
                    finding.confidence,
                    &finding.description,
                    &finding.evidence,
                    &finding.related_trade_ids,
                )
                .await?
            }
        };

        account_repo::raise_fraud_risk(&self.pool, trader_id, alert.confidence * 100.0).await?;
        counter!("fraud_alerts_total", "alert_type" => finding.alert_type.as_str()).increment(1);

        tracing::warn!(
            trader_id = %trader_id,
            alert_type = %finding.alert_type,
            severity = %alert.severity,
            confidence = alert.confidence,
            "Fraud alert raised"
        );

        Ok(alert)
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Run every detection check. Checks are independent; each contributes at
/// most one finding per run.
fn run_checks(
    trader_id: Uuid,
    features: &TradingPatternFeatures,
    scores: &PatternScores,
    trades: &[TraderTrade],
) -> Vec<Finding> {
    [
        check_wash_trading(trader_id, features, trades),
        check_manipulation(features, scores, trades),
        check_bot_behavior(features),
        check_unusual_activity(features),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Wash trading: a meaningful share of the window was traded against the
/// trader's own account.
fn check_wash_trading(
    trader_id: Uuid,
    features: &TradingPatternFeatures,
    trades: &[TraderTrade],
) -> Option<Finding> {
    if features.total_trades < WASH_TRADING_MIN_TRADES
        || features.self_trade_ratio <= scoring::SELF_TRADE_RATIO_THRESHOLD
    {
        return None;
    }

    let related_trade_ids = features::self_trade_ids(trader_id, trades);
    let confidence = (features.self_trade_ratio * 3.0).min(1.0);

    Some(Finding {
        alert_type: AlertType::WashTrading,
        confidence,
        description: "Trader repeatedly executes against their own account".to_string(),
        evidence: vec![format!(
            "{} of {} trades are self-trades (ratio {:.2})",
            related_trade_ids.len(),
            features.total_trades,
            features.self_trade_ratio
        )],
        related_trade_ids,
    })
}

/// Manipulation: round-trip churn and a high composite score each add
/// confidence; fires once the total clears the floor.
fn check_manipulation(
    features: &TradingPatternFeatures,
    scores: &PatternScores,
    trades: &[TraderTrade],
) -> Option<Finding> {
    let mut confidence = 0.0;
    let mut evidence = Vec::new();

    if features.round_trip_ratio > scoring::ROUND_TRIP_RATIO_THRESHOLD {
        confidence += features.round_trip_ratio;
        evidence.push(format!(
            "{:.0}% of trades close a buy within an hour",
            features.round_trip_ratio * 100.0
        ));
    }
    if scores.manipulation > scoring::MANIPULATION_SCORE_THRESHOLD {
        confidence += scores.manipulation * 0.5;
        evidence.push(format!(
            "composite manipulation score {:.2}",
            scores.manipulation
        ));
    }

    if confidence <= scoring::ALERT_CONFIDENCE_FLOOR {
        return None;
    }

    // Both signals together can exceed 1; severity bands and the fraud risk
    // score expect [0, 1].
    Some(Finding {
        alert_type: AlertType::Manipulation,
        confidence: confidence.min(1.0),
        description: "Trading pattern consistent with price manipulation".to_string(),
        evidence,
        related_trade_ids: features::round_trip_closing_legs(trades),
    })
}

/// Bot behavior: machine-regular timing or near-constant order sizing.
fn check_bot_behavior(features: &TradingPatternFeatures) -> Option<Finding> {
    let mut confidence = 0.0;
    let mut evidence = Vec::new();

    if features.trade_gap_stddev_ms < scoring::BOT_TIMING_STDDEV_MS {
        confidence += 0.5;
        evidence.push(format!(
            "inter-trade timing stddev {:.1}ms",
            features.trade_gap_stddev_ms
        ));
    }
    if features.order_size_mean > 0.0 {
        let cv = features.order_size_stddev / features.order_size_mean;
        if cv < scoring::BOT_SIZE_CV_THRESHOLD {
            confidence += 0.3;
            evidence.push(format!("order size coefficient of variation {:.3}", cv));
        }
    }

    if confidence <= scoring::ALERT_CONFIDENCE_FLOOR {
        return None;
    }

    Some(Finding {
        alert_type: AlertType::BotBehavior,
        confidence,
        description: "Trade timing and sizing look automated".to_string(),
        evidence,
        related_trade_ids: Vec::new(),
    })
}

/// Reserved alert type; no heuristics are wired up yet, so it never fires.
fn check_unusual_activity(_features: &TradingPatternFeatures) -> Option<Finding> {
    // TODO: baseline volume-spike detection against the trader's own history.
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
