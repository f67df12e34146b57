use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::PlatformConfig;
use crate::db::{account_repo, subscription_repo};
use crate::errors::{AppError, CopyTradingError};
use crate::models::subscription::{subscription_status, NewSubscription};
use crate::models::{CopySubscription, SizingMode};

/// Tunable subscription settings, shared between create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionSettings {
    pub sizing_mode: String,
    pub fixed_amount: Option<Decimal>,
    pub portfolio_pct: Option<Decimal>,
    pub copy_ratio: Option<Decimal>,
    pub max_position_size: Decimal,
    pub max_daily_loss: Decimal,
    pub max_total_exposure: Decimal,
    #[serde(default)]
    pub copy_asset_classes: Vec<String>,
    #[serde(default)]
    pub excluded_symbols: Vec<String>,
    #[serde(default)]
    pub copy_delay_seconds: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub follower_id: Uuid,
    pub leader_id: Uuid,
    #[serde(flatten)]
    pub settings: SubscriptionSettings,
}

/// Subscribe a follower to a leader. The subscription starts `active`.
pub async fn create_subscription(
    pool: &PgPool,
    platform: &PlatformConfig,
    req: &CreateSubscriptionRequest,
) -> Result<CopySubscription, AppError> {
    if req.follower_id == req.leader_id {
        return Err(CopyTradingError::SelfCopy.into());
    }

    let validated = validate_settings(&req.settings)?;

    if subscription_repo::find_live_pair(pool, req.follower_id, req.leader_id)
        .await?
        .is_some()
    {
        return Err(CopyTradingError::AlreadySubscribed.into());
    }

    let live = subscription_repo::count_live_subscriptions(pool, req.follower_id).await?;
    if live >= platform.max_subscriptions_per_follower {
        return Err(CopyTradingError::MaxCopiesExceeded(platform.max_subscriptions_per_follower).into());
    }

    // Account rows are created on first sight, fills included.
    account_repo::upsert_account(pool, req.follower_id).await?;
    account_repo::upsert_account(pool, req.leader_id).await?;

    let new = validated.into_new_subscription(req.follower_id, req.leader_id);
    let sub = subscription_repo::insert_subscription(pool, &new).await?;

    tracing::info!(
        subscription = %sub.id,
        follower = %sub.follower_id,
        leader = %sub.leader_id,
        mode = %sub.sizing_mode,
        "Subscription created"
    );

    Ok(sub)
}

/// Replace the settings of a live subscription.
pub async fn update_subscription(
    pool: &PgPool,
    id: Uuid,
    settings: &SubscriptionSettings,
) -> Result<CopySubscription, AppError> {
    let existing = subscription_repo::get_subscription(pool, id)
        .await?
        .ok_or(CopyTradingError::NotFound)?;

    if existing.is_terminal() {
        return Err(CopyTradingError::InvalidStatus(format!(
            "cannot update a {} subscription",
            existing.status
        ))
        .into());
    }

    let validated = validate_settings(settings)?;
    let new = validated.into_new_subscription(existing.follower_id, existing.leader_id);
    let sub = subscription_repo::update_settings(pool, id, &new).await?;

    tracing::info!(subscription = %sub.id, "Subscription settings updated");

    Ok(sub)
}

/// Pause an active subscription.
pub async fn pause_subscription(pool: &PgPool, id: Uuid) -> Result<CopySubscription, AppError> {
    transition(pool, id, subscription_status::PAUSED).await
}

/// Resume a paused subscription.
pub async fn resume_subscription(pool: &PgPool, id: Uuid) -> Result<CopySubscription, AppError> {
    transition(pool, id, subscription_status::ACTIVE).await
}

/// Cancel a live subscription. Terminal.
pub async fn cancel_subscription(pool: &PgPool, id: Uuid) -> Result<CopySubscription, AppError> {
    transition(pool, id, subscription_status::CANCELLED).await
}

async fn transition(
    pool: &PgPool,
    id: Uuid,
    to: &'static str,
) -> Result<CopySubscription, AppError> {
    let existing = subscription_repo::get_subscription(pool, id)
        .await?
        .ok_or(CopyTradingError::NotFound)?;

    if !can_transition(&existing.status, to) {
        return Err(
            CopyTradingError::InvalidStatus(format!("{} -> {}", existing.status, to)).into(),
        );
    }

    let sub = subscription_repo::set_status(pool, id, to).await?;

    tracing::info!(subscription = %sub.id, from = existing.status, to, "Subscription status changed");

    Ok(sub)
}

/// Lifecycle rules: transitions are monotonic except active⇄paused.
pub fn can_transition(from: &str, to: &str) -> bool {
    use subscription_status::*;

    match (from, to) {
        (PENDING, ACTIVE) | (PENDING, CANCELLED) | (PENDING, EXPIRED) => true,
        (ACTIVE, PAUSED) | (ACTIVE, CANCELLED) | (ACTIVE, EXPIRED) => true,
        (PAUSED, ACTIVE) | (PAUSED, CANCELLED) | (PAUSED, EXPIRED) => true,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct ValidatedSettings {
    sizing_mode: SizingMode,
    fixed_amount: Option<Decimal>,
    portfolio_pct: Option<Decimal>,
    copy_ratio: Option<Decimal>,
    max_position_size: Decimal,
    max_daily_loss: Decimal,
    max_total_exposure: Decimal,
    copy_asset_classes: Vec<String>,
    excluded_symbols: Vec<String>,
    copy_delay_seconds: i32,
    expires_at: Option<DateTime<Utc>>,
}

impl ValidatedSettings {
    fn into_new_subscription(self, follower_id: Uuid, leader_id: Uuid) -> NewSubscription {
        NewSubscription {
            follower_id,
            leader_id,
            sizing_mode: self.sizing_mode,
            fixed_amount: self.fixed_amount,
            portfolio_pct: self.portfolio_pct,
            copy_ratio: self.copy_ratio,
            max_position_size: self.max_position_size,
            max_daily_loss: self.max_daily_loss,
            max_total_exposure: self.max_total_exposure,
            copy_asset_classes: self.copy_asset_classes,
            excluded_symbols: self.excluded_symbols,
            copy_delay_seconds: self.copy_delay_seconds,
            expires_at: self.expires_at,
        }
    }
}

fn validate_settings(s: &SubscriptionSettings) -> Result<ValidatedSettings, AppError> {
    let mode = SizingMode::from_str(&s.sizing_mode)
        .ok_or_else(|| AppError::BadRequest(format!("unknown sizing mode: {}", s.sizing_mode)))?;

    // Exactly one mode parameter survives; the others are dropped.
    let (fixed_amount, portfolio_pct, copy_ratio) = match mode {
        SizingMode::FixedAmount => {
            let amount = require_positive(s.fixed_amount, "fixed_amount")?;
            (Some(amount), None, None)
        }
        SizingMode::PercentagePortfolio => {
            let pct = require_positive(s.portfolio_pct, "portfolio_pct")?;
            if pct > Decimal::ONE_HUNDRED {
                return Err(CopyTradingError::InvalidAmount(
                    "portfolio_pct cannot exceed 100".into(),
                )
                .into());
            }
            (None, Some(pct), None)
        }
        SizingMode::Proportional => (None, None, None),
        SizingMode::FixedRatio => {
            let ratio = require_positive(s.copy_ratio, "copy_ratio")?;
            (None, None, Some(ratio))
        }
    };

    for (name, cap) in [
        ("max_position_size", s.max_position_size),
        ("max_daily_loss", s.max_daily_loss),
        ("max_total_exposure", s.max_total_exposure),
    ] {
        if cap <= Decimal::ZERO {
            return Err(CopyTradingError::InvalidAmount(format!(
                "{name} must be positive"
            ))
            .into());
        }
    }

    if s.copy_delay_seconds < 0 {
        return Err(AppError::BadRequest("copy_delay_seconds cannot be negative".into()));
    }

    Ok(ValidatedSettings {
        sizing_mode: mode,
        fixed_amount,
        portfolio_pct,
        copy_ratio,
        max_position_size: s.max_position_size,
        max_daily_loss: s.max_daily_loss,
        max_total_exposure: s.max_total_exposure,
        copy_asset_classes: s.copy_asset_classes.clone(),
        excluded_symbols: s.excluded_symbols.clone(),
        copy_delay_seconds: s.copy_delay_seconds,
        expires_at: s.expires_at,
    })
}

fn require_positive(value: Option<Decimal>, name: &str) -> Result<Decimal, CopyTradingError> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(v),
        Some(_) => Err(CopyTradingError::InvalidAmount(format!(
            "{name} must be positive"
        ))),
        None => Err(CopyTradingError::InvalidAmount(format!("{name} is required"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
