use rust_decimal::Decimal;

use crate::models::{CopySubscription, SizingMode};

/// Store reads the sizing step needs, captured once at decision time.
#[derive(Debug, Clone, Copy)]
pub struct SizingInputs {
    pub leader_quantity: Decimal,
    pub leader_price: Decimal,
    pub follower_balance: Decimal,
    pub follower_portfolio: Decimal,
    pub leader_portfolio: Decimal,
}

/// Compute the copy quantity for one subscription and one leader fill.
///
/// Returns zero when the mode parameter is missing or the inputs make the
/// mode undefined (zero price, zero leader portfolio); the caller turns a
/// non-positive quantity into a skip.
pub fn compute_copy_quantity(sub: &CopySubscription, inputs: &SizingInputs) -> Decimal {
    let Some(mode) = SizingMode::from_str(&sub.sizing_mode) else {
        return Decimal::ZERO;
    };

    match mode {
        SizingMode::FixedAmount => {
            fixed_amount_quantity(sub.fixed_amount.unwrap_or_default(), inputs.leader_price)
        }
        SizingMode::PercentagePortfolio => percentage_portfolio_quantity(
            inputs.follower_balance,
            sub.portfolio_pct.unwrap_or_default(),
            inputs.leader_price,
        ),
        SizingMode::Proportional => proportional_quantity(
            inputs.follower_portfolio,
            inputs.leader_quantity * inputs.leader_price,
            inputs.leader_portfolio,
            inputs.leader_price,
        ),
        SizingMode::FixedRatio => {
            fixed_ratio_quantity(inputs.leader_quantity, sub.copy_ratio.unwrap_or_default())
        }
    }
}

/// Fixed dollar amount: spend the configured amount at the leader's price.
fn fixed_amount_quantity(amount: Decimal, leader_price: Decimal) -> Decimal {
    if leader_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    amount / leader_price
}

/// Percentage of the follower's available balance.
fn percentage_portfolio_quantity(balance: Decimal, pct: Decimal, leader_price: Decimal) -> Decimal {
    if leader_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    balance * pct / Decimal::ONE_HUNDRED / leader_price
}

/// Mirror the portfolio fraction the leader risked.
fn proportional_quantity(
    follower_portfolio: Decimal,
    leader_trade_value: Decimal,
    leader_portfolio: Decimal,
    leader_price: Decimal,
) -> Decimal {
    if leader_portfolio.is_zero() || leader_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    follower_portfolio * (leader_trade_value / leader_portfolio) / leader_price
}

/// Direct quantity ratio; price plays no part.
fn fixed_ratio_quantity(leader_quantity: Decimal, ratio: Decimal) -> Decimal {
    leader_quantity * ratio
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
