use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::broker::{OrderGateway, OrderRequest};
use crate::config::PlatformConfig;
use crate::db::{account_repo, copy_trade_repo, subscription_repo, trade_repo};
use crate::models::copy_trade::{copy_trade_status, NewCopyTrade};
use crate::models::subscription::subscription_status;
use crate::models::{CopySubscription, CopyTrade, LeaderFill, TraderTrade};
use crate::services::notifier::{self, Notifier};

use super::risk_gates::{self, SkipReason};
use super::sizer::{self, SizingInputs};

/// Cancellation reason stamped on delayed trades whose subscription went
/// inactive before the delay elapsed.
pub const CANCEL_REASON_INACTIVE: &str = "Subscription not active";

/// Deterministic client order id for one (subscription, leader trade) pair.
/// A retried placement carries the same id and cannot become a second order.
pub fn derive_client_order_id(subscription_id: Uuid, leader_trade_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subscription_id.as_bytes());
    hasher.update(leader_trade_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Platform fee on a filled copy trade.
pub fn compute_fee(quantity: Decimal, price: Decimal, fee_pct: Decimal) -> Decimal {
    quantity * price * fee_pct / Decimal::ONE_HUNDRED
}

/// Fans a leader fill out over the active subscriptions to that leader and
/// executes due delayed trades. Holds no state of its own beyond the pause
/// flag; every decision reads the store.
pub struct CopyEngine {
    pool: PgPool,
    gateway: Arc<dyn OrderGateway>,
    platform: PlatformConfig,
    notifier: Option<Arc<Notifier>>,
    pause_flag: Arc<AtomicBool>,
}

impl CopyEngine {
    pub fn new(
        pool: PgPool,
        gateway: Arc<dyn OrderGateway>,
        platform: PlatformConfig,
        notifier: Option<Arc<Notifier>>,
        pause_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            pool,
            gateway,
            platform,
            notifier,
            pause_flag,
        }
    }

    /// Process one leader fill: record it in the trade log, then attempt a
    /// replication per active subscription.
    ///
    /// Per-subscription outcomes (`filled`/`skipped`/`failed`/`pending`) are
    /// data and appear in the returned list; a subscription whose processing
    /// errors out is logged and excluded, never aborting the batch. A
    /// replayed fill returns the previously created records.
    pub async fn process_leader_fill(&self, fill: &LeaderFill) -> anyhow::Result<Vec<CopyTrade>> {
        let start = Instant::now();

        tracing::info!(
            trade = %fill.trade_id,
            leader = %fill.trader_id,
            symbol = %fill.symbol,
            side = %fill.side,
            quantity = %fill.quantity,
            price = %fill.price,
            "Processing leader fill"
        );

        counter!("leader_fills_total").increment(1);

        // Step 1: Record in the platform trade log (idempotent on trade id)
        account_repo::upsert_account(&self.pool, fill.trader_id).await?;
        let trade = trade_repo::record_fill(&self.pool, fill).await?;

        // Step 2: Replay check. The unique pair index means a re-delivered
        // fill already has its replication records
        let existing = copy_trade_repo::get_by_leader_trade(&self.pool, trade.id).await?;
        if !existing.is_empty() {
            tracing::info!(
                trade = %trade.id,
                count = existing.len(),
                "Leader fill already fanned out, returning existing records"
            );
            return Ok(existing);
        }

        // Step 3: Paused engines log the fill but do not replicate
        if self.pause_flag.load(Ordering::Relaxed) {
            tracing::info!(trade = %trade.id, "Copy engine paused, fill logged only");
            return Ok(Vec::new());
        }

        // Step 4: Fan out
        let subscriptions =
            subscription_repo::get_active_subscriptions_for_leader(&self.pool, trade.trader_id)
                .await?;

        let mut results = Vec::with_capacity(subscriptions.len());
        for sub in &subscriptions {
            match self.process_subscription(sub, &trade).await {
                Ok(copy_trade) => results.push(copy_trade),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        subscription = %sub.id,
                        trade = %trade.id,
                        "Subscription processing failed, continuing fan-out"
                    );
                }
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        histogram!("fan_out_duration_seconds").record(elapsed);

        tracing::info!(
            trade = %trade.id,
            subscriptions = subscriptions.len(),
            records = results.len(),
            "Fan-out complete"
        );

        Ok(results)
    }

    /// Evaluate the risk gates for one subscription and create exactly one
    /// CopyTrade record. First failing gate short-circuits as `skipped`.
    async fn process_subscription(
        &self,
        sub: &CopySubscription,
        trade: &TraderTrade,
    ) -> anyhow::Result<CopyTrade> {
        // Gates 1-2: allow-list and exclude-list
        if let Err(reason) = risk_gates::check_trade_filters(sub, &trade.asset_class, &trade.symbol)
        {
            return self.record_skip(sub, trade, Decimal::ZERO, reason).await;
        }

        // Gate 3: daily realized loss cap
        let daily_pnl = copy_trade_repo::sum_daily_realized_pnl(&self.pool, sub.id).await?;
        if let Err(reason) = risk_gates::check_daily_loss(daily_pnl, sub.max_daily_loss) {
            return self.record_skip(sub, trade, Decimal::ZERO, reason).await;
        }

        // Sizing reads real balances; there are no placeholder values
        let follower = account_repo::get_account(&self.pool, sub.follower_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("follower account {} missing", sub.follower_id))?;
        let leader = account_repo::get_account(&self.pool, sub.leader_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("leader account {} missing", sub.leader_id))?;

        let inputs = SizingInputs {
            leader_quantity: trade.quantity,
            leader_price: trade.price,
            follower_balance: follower.available_balance,
            follower_portfolio: follower.portfolio_value,
            leader_portfolio: leader.portfolio_value,
        };
        let copy_quantity = sizer::compute_copy_quantity(sub, &inputs);

        // Gates 4-6: quantity, position cap, exposure cap
        let position_value = match risk_gates::check_position_limits(
            sub,
            copy_quantity,
            trade.price,
            follower.total_exposure,
        ) {
            Ok(value) => value,
            Err(reason) => return self.record_skip(sub, trade, copy_quantity, reason).await,
        };

        // Delayed subscriptions freeze the decision and defer placement
        if sub.copy_delay_seconds > 0 {
            let execute_after = Utc::now() + Duration::seconds(sub.copy_delay_seconds as i64);
            let mut new = self.new_record(sub, trade, copy_quantity, copy_trade_status::PENDING, None);
            new.execute_after = Some(execute_after);
            let pending = copy_trade_repo::insert_copy_trade(&self.pool, &new).await?;

            counter!("copy_trades_delayed").increment(1);
            tracing::info!(
                copy_trade = %pending.id,
                subscription = %sub.id,
                execute_after = %execute_after,
                "Copy trade deferred"
            );
            return Ok(pending);
        }

        // Immediate path: claim the pair, then place
        let executing = copy_trade_repo::insert_copy_trade(
            &self.pool,
            &self.new_record(sub, trade, copy_quantity, copy_trade_status::EXECUTING, None),
        )
        .await?;

        tracing::debug!(
            copy_trade = %executing.id,
            subscription = %sub.id,
            quantity = %copy_quantity,
            value = %position_value,
            "Placing replica order"
        );

        self.fill_copy_trade(&executing, sub).await
    }

    /// Second phase for a delayed copy trade. Returns None when another
    /// worker already handled the row.
    pub async fn execute_due_copy(&self, row: &CopyTrade) -> anyhow::Result<Option<CopyTrade>> {
        let sub = subscription_repo::get_subscription(&self.pool, row.subscription_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("subscription {} missing", row.subscription_id))?;

        // Lazily lapse a subscription that expired while the trade waited
        let sub = if sub.status == subscription_status::ACTIVE
            && sub.expires_at.is_some_and(|at| at <= Utc::now())
        {
            let lapsed =
                subscription_repo::set_status(&self.pool, sub.id, subscription_status::EXPIRED)
                    .await?;
            tracing::info!(subscription = %lapsed.id, "Subscription expired before delayed execution");
            lapsed
        } else {
            sub
        };

        if !sub.is_active() {
            let cancelled =
                copy_trade_repo::cancel_if_pending(&self.pool, row.id, CANCEL_REASON_INACTIVE)
                    .await?;
            if cancelled.is_some() {
                counter!("copy_trades_cancelled").increment(1);
                tracing::info!(
                    copy_trade = %row.id,
                    subscription = %sub.id,
                    status = %sub.status,
                    "Delayed copy trade cancelled"
                );
            }
            return Ok(cancelled);
        }

        // Claim pending → executing; a lost race means someone else ran it
        let Some(claimed) = copy_trade_repo::claim_pending(&self.pool, row.id).await? else {
            return Ok(None);
        };

        let filled = self.fill_copy_trade(&claimed, &sub).await?;
        Ok(Some(filled))
    }

    /// Close a filled copy trade against an exit price: realized P&L is
    /// recorded, `fee` backfills the stored fee when given, and the
    /// follower's exposure is released. Returns None when the trade is
    /// missing, not `filled`, or already closed.
    pub async fn close_copy_trade(
        &self,
        id: Uuid,
        exit_price: Decimal,
        fee: Option<Decimal>,
    ) -> anyhow::Result<Option<CopyTrade>> {
        let Some(open) = copy_trade_repo::get_copy_trade(&self.pool, id).await? else {
            return Ok(None);
        };

        // Longs profit when price rises, shorts when it falls
        let realized_pnl = if open.side.eq_ignore_ascii_case("sell") {
            (open.leader_price - exit_price) * open.copy_quantity
        } else {
            (exit_price - open.leader_price) * open.copy_quantity
        };

        let Some(closed) = copy_trade_repo::close_trade(&self.pool, id, realized_pnl, fee).await?
        else {
            return Ok(None);
        };

        account_repo::release_exposure(&self.pool, closed.follower_id, closed.position_value())
            .await?;

        counter!("copy_trades_closed").increment(1);
        tracing::info!(
            copy_trade = %closed.id,
            realized_pnl = %realized_pnl,
            exit_price = %exit_price,
            "Copy trade closed"
        );

        Ok(Some(closed))
    }

    /// Place the replica order and settle the record. Gateway failure is a
    /// data outcome: the row goes `failed` with the caught message and is
    /// never retried here.
    async fn fill_copy_trade(
        &self,
        row: &CopyTrade,
        sub: &CopySubscription,
    ) -> anyhow::Result<CopyTrade> {
        let request = OrderRequest {
            user_id: row.follower_id,
            symbol: row.symbol.clone(),
            side: row.side.clone(),
            order_type: "market".into(),
            quantity: row.copy_quantity,
            price: Some(row.leader_price),
            client_order_id: row.client_order_id.clone(),
        };

        match self.gateway.place_order(&request).await {
            Ok(placed) => {
                let fee = compute_fee(
                    row.copy_quantity,
                    row.leader_price,
                    self.platform.platform_fee_pct,
                );

                let filled =
                    copy_trade_repo::mark_filled(&self.pool, row.id, &placed.id, fee).await?;

                account_repo::add_exposure(
                    &self.pool,
                    filled.follower_id,
                    filled.position_value(),
                )
                .await?;
                subscription_repo::record_fill_totals(&self.pool, sub.id, fee).await?;

                counter!("copy_trades_filled").increment(1);
                tracing::info!(
                    copy_trade = %filled.id,
                    order = %placed.id,
                    quantity = %filled.copy_quantity,
                    fee = %fee,
                    "Copy trade filled"
                );

                if let Some(n) = &self.notifier {
                    n.send(&notifier::format_copy_fill(&filled)).await;
                }

                Ok(filled)
            }
            Err(e) => {
                let message = e.to_string();
                counter!("copy_trades_failed").increment(1);
                tracing::error!(
                    copy_trade = %row.id,
                    error = %message,
                    "Replica order placement failed"
                );

                let failed = copy_trade_repo::mark_failed(&self.pool, row.id, &message).await?;
                Ok(failed)
            }
        }
    }

    async fn record_skip(
        &self,
        sub: &CopySubscription,
        trade: &TraderTrade,
        copy_quantity: Decimal,
        reason: SkipReason,
    ) -> anyhow::Result<CopyTrade> {
        let skipped = copy_trade_repo::insert_copy_trade(
            &self.pool,
            &self.new_record(
                sub,
                trade,
                copy_quantity,
                copy_trade_status::SKIPPED,
                Some(reason.as_str().to_string()),
            ),
        )
        .await?;

        counter!("copy_trades_skipped").increment(1);
        tracing::debug!(
            subscription = %sub.id,
            trade = %trade.id,
            reason = %reason,
            "Copy trade skipped"
        );

        Ok(skipped)
    }

    fn new_record(
        &self,
        sub: &CopySubscription,
        trade: &TraderTrade,
        copy_quantity: Decimal,
        status: &str,
        reason: Option<String>,
    ) -> NewCopyTrade {
        NewCopyTrade {
            subscription_id: sub.id,
            leader_trade_id: trade.id,
            follower_id: sub.follower_id,
            leader_id: sub.leader_id,
            symbol: trade.symbol.clone(),
            side: trade.side.clone(),
            asset_class: trade.asset_class.clone(),
            leader_quantity: trade.quantity,
            leader_price: trade.price,
            copy_quantity,
            status: status.to_string(),
            reason,
            client_order_id: derive_client_order_id(sub.id, trade.id),
            execute_after: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
