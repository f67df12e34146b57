mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use echotrade::analysis::PatternAnalyzer;
use echotrade::config::PlatformConfig;
use echotrade::db::{account_repo, alert_repo};
use echotrade::errors::{AppError, FraudDetectionError};

/// Irregular minute offsets, so timing and sizing stay organic unless a test
/// wants them machine-regular.
const OFFSETS_MIN: [i64; 16] = [0, 7, 19, 26, 41, 55, 68, 80, 97, 103, 120, 139, 151, 170, 188, 201];

fn analyzer(pool: &PgPool) -> PatternAnalyzer {
    PatternAnalyzer::new(pool.clone(), PlatformConfig::default())
}

/// Buys with irregular spacing and varied sizes inside yesterday's session.
/// The first `self_trades` rows carry the trader as their own counterparty.
async fn seed_irregular_window(pool: &PgPool, trader: Uuid, total: usize, self_trades: usize) {
    let base = Utc::now() - Duration::days(1);
    for i in 0..total {
        let counterparty = (i < self_trades).then_some(trader);
        common::seed_trade(
            pool,
            trader,
            "ETH-USD",
            "buy",
            Decimal::from(1 + i as i64),
            Decimal::from(100),
            counterparty,
            base + Duration::minutes(OFFSETS_MIN[i % OFFSETS_MIN.len()]),
        )
        .await;
    }
}

#[tokio::test]
async fn test_insufficient_data_is_rejected() {
    let pool = common::setup_test_db().await;
    let trader = Uuid::new_v4();
    common::seed_account(&pool, trader, Decimal::ZERO, Decimal::from(10_000)).await;
    seed_irregular_window(&pool, trader, 3, 0).await;

    let err = analyzer(&pool)
        .analyze_trader(trader)
        .await
        .expect_err("Three trades are below the window minimum");

    match err {
        AppError::Fraud(FraudDetectionError::InsufficientData { trades, min }) => {
            assert_eq!(trades, 3);
            assert_eq!(min, 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_trader_is_rejected() {
    let pool = common::setup_test_db().await;

    let err = analyzer(&pool)
        .analyze_trader(Uuid::new_v4())
        .await
        .expect_err("Unknown trader must not be analyzable");

    assert!(matches!(
        err,
        AppError::Fraud(FraudDetectionError::TraderNotFound)
    ));
}

#[tokio::test]
async fn test_clean_trader_writes_scores_without_alerts() {
    let pool = common::setup_test_db().await;
    let trader = Uuid::new_v4();
    common::seed_account(&pool, trader, Decimal::ZERO, Decimal::from(10_000)).await;
    seed_irregular_window(&pool, trader, 12, 0).await;

    let report = analyzer(&pool)
        .analyze_trader(trader)
        .await
        .expect("Analysis should succeed");

    assert!(report.alerts.is_empty(), "Clean window must raise nothing");
    assert_eq!(report.features.total_trades, 12);
    assert_eq!(report.scores.manipulation, 0.0);
    assert_eq!(report.scores.alpha, 1.0);
    // 12 of 500 trades: luck barely decayed, skill barely earned
    assert!((report.scores.luck - 0.976).abs() < 1e-9);
    assert!((report.scores.skill - 0.024).abs() < 1e-9);

    let account = account_repo::get_account(&pool, trader)
        .await
        .expect("DB query should succeed")
        .expect("Trader should exist");
    assert_eq!(account.alpha_score, Some(1.0));
    assert_eq!(account.manipulation_score, Some(0.0));
    assert!(account.last_analyzed_at.is_some());
    assert_eq!(account.fraud_risk_score, 0.0);
    assert_eq!(account.suspicious_activity_count, 0);
}

#[tokio::test]
async fn test_wash_trading_alert_created_then_merged() {
    let pool = common::setup_test_db().await;
    let trader = Uuid::new_v4();
    common::seed_account(&pool, trader, Decimal::ZERO, Decimal::from(10_000)).await;
    // 3 of 12 trades against the trader's own account
    seed_irregular_window(&pool, trader, 12, 3).await;

    let first = analyzer(&pool)
        .analyze_trader(trader)
        .await
        .expect("Analysis should succeed");

    assert_eq!(first.alerts.len(), 1, "Only the wash check should fire");
    let alert = &first.alerts[0];
    assert_eq!(alert.alert_type, "wash_trading");
    // ratio 0.25, tripled
    assert!((alert.confidence - 0.75).abs() < 1e-9);
    assert_eq!(alert.severity, "high");
    assert_eq!(alert.status, "pending");
    assert_eq!(alert.related_trade_ids.len(), 3);
    assert_eq!(alert.evidence.len(), 1);

    // A repeat detection folds into the open alert instead of stacking
    let second = analyzer(&pool)
        .analyze_trader(trader)
        .await
        .expect("Analysis should succeed");

    assert_eq!(second.alerts.len(), 1);
    let merged = &second.alerts[0];
    assert_eq!(merged.id, alert.id);
    assert_eq!(merged.confidence, alert.confidence);
    assert_eq!(merged.evidence.len(), 2);
    assert_eq!(merged.related_trade_ids.len(), 6);

    let open = alert_repo::find_active_alert(&pool, trader, "wash_trading")
        .await
        .expect("DB query should succeed");
    assert!(open.is_some());

    let all = alert_repo::list_alerts(&pool, Some(trader), None, 50)
        .await
        .expect("DB query should succeed");
    assert_eq!(all.len(), 1, "Merge must not create a second row");

    // Every alert event ratchets the account risk fields
    let account = account_repo::get_account(&pool, trader)
        .await
        .expect("DB query should succeed")
        .expect("Trader should exist");
    assert!((account.fraud_risk_score - 75.0).abs() < 1e-9);
    assert_eq!(account.suspicious_activity_count, 2);
}

#[tokio::test]
async fn test_round_trip_churn_raises_manipulation_alert() {
    let pool = common::setup_test_db().await;
    let trader = Uuid::new_v4();
    common::seed_account(&pool, trader, Decimal::ZERO, Decimal::from(10_000)).await;

    // Six buy/sell pairs, each closed 11 minutes after it opened
    let base = Utc::now() - Duration::days(1);
    for pair in 0..6i64 {
        let qty = Decimal::from(1 + pair % 3);
        common::seed_trade(
            &pool,
            trader,
            "SOL-USD",
            "buy",
            qty,
            Decimal::from(100),
            None,
            base + Duration::minutes(pair * 37),
        )
        .await;
        common::seed_trade(
            &pool,
            trader,
            "SOL-USD",
            "sell",
            qty,
            Decimal::from(100),
            None,
            base + Duration::minutes(pair * 37 + 11),
        )
        .await;
    }

    let report = analyzer(&pool)
        .analyze_trader(trader)
        .await
        .expect("Analysis should succeed");

    assert!((report.features.round_trip_ratio - 0.5).abs() < 1e-9);
    assert_eq!(report.alerts.len(), 1);

    let alert = &report.alerts[0];
    assert_eq!(alert.alert_type, "manipulation");
    // 0.5 round-trip ratio + half of the 0.75 composite score
    assert!((alert.confidence - 0.875).abs() < 1e-9);
    assert_eq!(alert.severity, "high");
    assert_eq!(alert.related_trade_ids.len(), 6);
    assert_eq!(alert.evidence.len(), 2);

    let account = account_repo::get_account(&pool, trader)
        .await
        .expect("DB query should succeed")
        .expect("Trader should exist");
    assert!((account.manipulation_score.unwrap_or_default() - 0.75).abs() < 1e-9);
}

#[tokio::test]
async fn test_machine_regular_timing_raises_bot_alert() {
    let pool = common::setup_test_db().await;
    let trader = Uuid::new_v4();
    common::seed_account(&pool, trader, Decimal::ZERO, Decimal::from(10_000)).await;

    // Identical size, exactly one order per minute
    let base = Utc::now() - Duration::days(1);
    for i in 0..12i64 {
        common::seed_trade(
            &pool,
            trader,
            "BTC-USD",
            "buy",
            Decimal::ONE,
            Decimal::from(100),
            None,
            base + Duration::seconds(i * 60),
        )
        .await;
    }

    let report = analyzer(&pool)
        .analyze_trader(trader)
        .await
        .expect("Analysis should succeed");

    assert_eq!(report.features.trade_gap_stddev_ms, 0.0);
    assert_eq!(report.alerts.len(), 1);

    let alert = &report.alerts[0];
    assert_eq!(alert.alert_type, "bot_behavior");
    // 0.5 for the timing signature, 0.3 for the flat sizing
    assert!((alert.confidence - 0.8).abs() < 1e-9);
    assert_eq!(alert.severity, "high");
    assert!(alert.related_trade_ids.is_empty());
    assert_eq!(alert.evidence.len(), 2);
}
