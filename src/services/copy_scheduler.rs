use std::sync::Arc;

use metrics::gauge;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::db::{copy_trade_repo, subscription_repo};
use crate::execution::engine::CopyEngine;

/// Due delayed trades picked up per tick.
const DUE_BATCH_LIMIT: i64 = 100;

/// Run the copy scheduler loop. Each tick expires lapsed subscriptions and
/// executes delayed copy trades whose release time has passed.
pub async fn run_copy_scheduler(pool: PgPool, engine: Arc<CopyEngine>, poll_interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(poll_interval_secs));
    tracing::info!(interval_secs = poll_interval_secs, "Copy scheduler started");

    loop {
        ticker.tick().await;

        match subscription_repo::expire_due_subscriptions(&pool).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "Copy scheduler: subscriptions expired"),
            Err(e) => {
                tracing::error!(error = %e, "Copy scheduler: failed to expire subscriptions")
            }
        }

        if let Ok(active) = subscription_repo::count_active_subscriptions(&pool).await {
            gauge!("active_subscriptions").set(active as f64);
        }

        let due = match copy_trade_repo::get_due_delayed(&pool, DUE_BATCH_LIMIT).await {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "Copy scheduler: failed to fetch due copy trades");
                continue;
            }
        };

        if due.is_empty() {
            continue;
        }

        tracing::debug!(count = due.len(), "Copy scheduler: executing due copy trades");

        for trade in &due {
            match engine.execute_due_copy(trade).await {
                Ok(Some(settled)) => {
                    tracing::debug!(
                        copy_trade_id = %settled.id,
                        status = %settled.status,
                        "Copy scheduler: delayed copy settled"
                    );
                }
                Ok(None) => {
                    // Claimed by another worker between fetch and claim.
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        copy_trade_id = %trade.id,
                        "Copy scheduler: delayed copy failed"
                    );
                }
            }
        }
    }
}
