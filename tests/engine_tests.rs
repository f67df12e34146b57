mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use echotrade::broker::SimulatedGateway;
use echotrade::config::PlatformConfig;
use echotrade::db::{account_repo, copy_trade_repo, subscription_repo, trade_repo};
use echotrade::execution::engine::{CopyEngine, CANCEL_REASON_INACTIVE};
use echotrade::execution::subscriptions::{
    create_subscription, pause_subscription, CreateSubscriptionRequest, SubscriptionSettings,
};
use echotrade::models::{LeaderFill, Side};

fn default_settings() -> SubscriptionSettings {
    SubscriptionSettings {
        sizing_mode: "fixed_amount".into(),
        fixed_amount: Some(Decimal::from(500)),
        portfolio_pct: None,
        copy_ratio: None,
        max_position_size: Decimal::from(1_000),
        max_daily_loss: Decimal::from(500),
        max_total_exposure: Decimal::from(10_000),
        copy_asset_classes: vec!["crypto".into()],
        excluded_symbols: vec![],
        copy_delay_seconds: 0,
        expires_at: None,
    }
}

fn make_fill(trader_id: Uuid, symbol: &str, quantity: Decimal, price: Decimal) -> LeaderFill {
    LeaderFill {
        trade_id: Uuid::new_v4(),
        trader_id,
        symbol: symbol.into(),
        side: Side::Buy,
        asset_class: "crypto".into(),
        quantity,
        price,
        counterparty_id: None,
        executed_at: Utc::now(),
    }
}

fn build_engine(pool: &sqlx::PgPool, gateway: SimulatedGateway) -> CopyEngine {
    CopyEngine::new(
        pool.clone(),
        Arc::new(gateway),
        PlatformConfig::default(),
        None,
        Arc::new(AtomicBool::new(false)),
    )
}

/// Seed a funded follower subscribed to a leader, returning (follower,
/// leader, subscription id).
async fn seed_pair(pool: &sqlx::PgPool, settings: SubscriptionSettings) -> (Uuid, Uuid, Uuid) {
    let follower = Uuid::new_v4();
    let leader = Uuid::new_v4();

    common::seed_account(pool, follower, Decimal::from(10_000), Decimal::from(10_000)).await;
    common::seed_account(pool, leader, Decimal::from(50_000), Decimal::from(100_000)).await;

    let sub = create_subscription(
        pool,
        &PlatformConfig::default(),
        &CreateSubscriptionRequest {
            follower_id: follower,
            leader_id: leader,
            settings,
        },
    )
    .await
    .expect("Subscription should be created");

    (follower, leader, sub.id)
}

#[tokio::test]
async fn test_fill_fans_out_and_fills() {
    let pool = common::setup_test_db().await;
    let (follower, leader, sub_id) = seed_pair(&pool, default_settings()).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "BTC-USD", Decimal::new(5, 1), Decimal::from(50_000));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.subscription_id, sub_id);
    assert_eq!(record.status, "filled");
    // $500 fixed amount at $50,000 buys 0.01 units
    assert_eq!(record.copy_quantity, Decimal::new(1, 2));
    // 1% platform fee on the $500 notional
    assert_eq!(record.fee_amount, Decimal::from(5));
    assert!(record.order_id.is_some());
    assert!(record.executed_at.is_some());

    // Fill side effects: exposure added, subscription totals bumped
    let account = account_repo::get_account(&pool, follower)
        .await
        .expect("DB query should succeed")
        .expect("Follower should exist");
    assert_eq!(account.total_exposure, Decimal::from(500));

    let sub = subscription_repo::get_subscription(&pool, sub_id)
        .await
        .expect("DB query should succeed")
        .expect("Subscription should exist");
    assert_eq!(sub.total_copied_trades, 1);
    assert_eq!(sub.total_fees_paid, Decimal::from(5));
}

#[tokio::test]
async fn test_excluded_symbol_is_skipped() {
    let pool = common::setup_test_db().await;
    let mut settings = default_settings();
    settings.excluded_symbols = vec!["BTC-USD".into()];
    let (_, leader, _) = seed_pair(&pool, settings).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "skipped");
    assert_eq!(records[0].reason.as_deref(), Some("Symbol excluded"));
    assert!(records[0].order_id.is_none());
}

#[tokio::test]
async fn test_position_cap_is_skipped() {
    let pool = common::setup_test_db().await;
    let mut settings = default_settings();
    settings.fixed_amount = Some(Decimal::from(5_000));
    settings.max_position_size = Decimal::from(1_000);
    let (_, leader, _) = seed_pair(&pool, settings).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "ETH-USD", Decimal::from(2), Decimal::from(2_500));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "skipped");
    assert_eq!(records[0].reason.as_deref(), Some("Position size exceeded"));
}

#[tokio::test]
async fn test_replayed_fill_returns_existing_records() {
    let pool = common::setup_test_db().await;
    let (_, leader, _) = seed_pair(&pool, default_settings()).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));

    let first = engine
        .process_leader_fill(&fill)
        .await
        .expect("First delivery should succeed");
    let second = engine
        .process_leader_fill(&fill)
        .await
        .expect("Replay should succeed");

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].id, second[0].id, "Replay must not create a second record");

    let stored = copy_trade_repo::get_by_leader_trade(&pool, fill.trade_id)
        .await
        .expect("DB query should succeed");
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_gateway_failure_is_a_data_outcome() {
    let pool = common::setup_test_db().await;
    let (follower, leader, _) = seed_pair(&pool, default_settings()).await;

    let engine = build_engine(&pool, SimulatedGateway::failing("exchange is down"));
    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed even when placement fails");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "failed");
    assert!(records[0]
        .reason
        .as_deref()
        .is_some_and(|r| r.contains("exchange is down")));

    // A failed placement must not touch exposure
    let account = account_repo::get_account(&pool, follower)
        .await
        .expect("DB query should succeed")
        .expect("Follower should exist");
    assert_eq!(account.total_exposure, Decimal::ZERO);
}

#[tokio::test]
async fn test_no_subscribers_still_logs_the_trade() {
    let pool = common::setup_test_db().await;
    let leader = Uuid::new_v4();
    common::seed_account(&pool, leader, Decimal::ZERO, Decimal::from(100_000)).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");
    assert!(records.is_empty());

    let logged = trade_repo::count_trades_since(&pool, leader, Utc::now() - Duration::hours(1))
        .await
        .expect("DB query should succeed");
    assert_eq!(logged, 1);
}

#[tokio::test]
async fn test_delayed_copy_defers_then_executes() {
    let pool = common::setup_test_db().await;
    let mut settings = default_settings();
    settings.copy_delay_seconds = 60;
    let (_, leader, _) = seed_pair(&pool, settings).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "pending");
    assert!(records[0].execute_after.is_some_and(|at| at > Utc::now()));

    // Second phase settles the frozen decision
    let settled = engine
        .execute_due_copy(&records[0])
        .await
        .expect("Delayed execution should succeed")
        .expect("Row should be claimed, not raced away");

    assert_eq!(settled.status, "filled");
    assert_eq!(settled.copy_quantity, records[0].copy_quantity);
}

#[tokio::test]
async fn test_delayed_copy_cancelled_when_subscription_paused() {
    let pool = common::setup_test_db().await;
    let mut settings = default_settings();
    settings.copy_delay_seconds = 60;
    let (_, leader, sub_id) = seed_pair(&pool, settings).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");
    assert_eq!(records[0].status, "pending");

    pause_subscription(&pool, sub_id)
        .await
        .expect("Pause should succeed");

    let cancelled = engine
        .execute_due_copy(&records[0])
        .await
        .expect("Delayed execution should succeed")
        .expect("Row should be cancelled");

    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(cancelled.reason.as_deref(), Some(CANCEL_REASON_INACTIVE));
}

#[tokio::test]
async fn test_subscription_expiring_during_delay_lapses() {
    let pool = common::setup_test_db().await;
    let mut settings = default_settings();
    settings.copy_delay_seconds = 60;
    settings.expires_at = Some(Utc::now() + Duration::hours(1));
    let (_, leader, sub_id) = seed_pair(&pool, settings).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");
    assert_eq!(records[0].status, "pending");

    // Expiry passes while the trade waits
    sqlx::query("UPDATE copy_subscriptions SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(sub_id)
        .execute(&pool)
        .await
        .expect("DB update should succeed");

    let cancelled = engine
        .execute_due_copy(&records[0])
        .await
        .expect("Delayed execution should succeed")
        .expect("Row should be cancelled");

    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(cancelled.reason.as_deref(), Some(CANCEL_REASON_INACTIVE));

    let sub = subscription_repo::get_subscription(&pool, sub_id)
        .await
        .expect("DB query should succeed")
        .expect("Subscription should exist");
    assert_eq!(sub.status, "expired");
}

#[tokio::test]
async fn test_paused_engine_logs_fill_without_replicating() {
    let pool = common::setup_test_db().await;
    let (_, leader, _) = seed_pair(&pool, default_settings()).await;

    let pause_flag = Arc::new(AtomicBool::new(true));
    let engine = CopyEngine::new(
        pool.clone(),
        Arc::new(SimulatedGateway::new()),
        PlatformConfig::default(),
        None,
        Arc::clone(&pause_flag),
    );

    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));
    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");

    assert!(records.is_empty(), "Paused engine must not replicate");

    // The trade log still gets the row
    let logged = trade_repo::count_trades_since(&pool, leader, Utc::now() - Duration::hours(1))
        .await
        .expect("DB query should succeed");
    assert_eq!(logged, 1);

    let stored = copy_trade_repo::get_by_leader_trade(&pool, fill.trade_id)
        .await
        .expect("DB query should succeed");
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_close_releases_exposure_and_records_pnl() {
    let pool = common::setup_test_db().await;
    let (follower, leader, _) = seed_pair(&pool, default_settings()).await;

    let engine = build_engine(&pool, SimulatedGateway::new());
    let fill = make_fill(leader, "BTC-USD", Decimal::ONE, Decimal::from(50_000));

    let records = engine
        .process_leader_fill(&fill)
        .await
        .expect("Fan-out should succeed");
    assert_eq!(records[0].status, "filled");

    // Exit 10% higher: 0.01 × (55,000 - 50,000) = $50
    let closed = engine
        .close_copy_trade(records[0].id, Decimal::from(55_000), None)
        .await
        .expect("Close should succeed")
        .expect("Filled trade should close");

    assert_eq!(closed.realized_pnl, Some(Decimal::from(50)));
    assert!(closed.closed_at.is_some());

    let account = account_repo::get_account(&pool, follower)
        .await
        .expect("DB query should succeed")
        .expect("Follower should exist");
    assert_eq!(account.total_exposure, Decimal::ZERO);

    // A replayed close must not rewrite the settled row or touch exposure
    let again = engine
        .close_copy_trade(records[0].id, Decimal::from(60_000), None)
        .await
        .expect("Close should succeed");
    assert!(again.is_none());
}
