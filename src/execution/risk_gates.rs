use rust_decimal::Decimal;
use std::fmt;

use crate::models::CopySubscription;

/// Why a leader fill was not replicated for one subscription.
///
/// Skips are expected business outcomes recorded on the CopyTrade row, not
/// errors; the strings are part of the stored contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AssetClassNotAllowed,
    SymbolExcluded,
    DailyLossReached,
    QuantityTooSmall,
    PositionSizeExceeded,
    ExposureExceeded,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AssetClassNotAllowed => "Asset class not allowed",
            SkipReason::SymbolExcluded => "Symbol excluded",
            SkipReason::DailyLossReached => "Daily loss limit reached",
            SkipReason::QuantityTooSmall => "Copy quantity too small",
            SkipReason::PositionSizeExceeded => "Position size exceeded",
            SkipReason::ExposureExceeded => "Total exposure exceeded",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gates 1-2: asset-class allow-list, then symbol exclude-list.
pub fn check_trade_filters(
    sub: &CopySubscription,
    asset_class: &str,
    symbol: &str,
) -> Result<(), SkipReason> {
    if !sub.copy_asset_classes.iter().any(|c| c == asset_class) {
        return Err(SkipReason::AssetClassNotAllowed);
    }

    if sub.excluded_symbols.iter().any(|s| s == symbol) {
        return Err(SkipReason::SymbolExcluded);
    }

    Ok(())
}

/// Gate 3: today's realized P&L for the subscription must not be below
/// the loss cap.
pub fn check_daily_loss(
    daily_realized_pnl: Decimal,
    max_daily_loss: Decimal,
) -> Result<(), SkipReason> {
    if daily_realized_pnl < -max_daily_loss {
        return Err(SkipReason::DailyLossReached);
    }

    Ok(())
}

/// Gates 4-6: quantity sanity, position-size cap, exposure cap.
/// Returns the position value on success.
pub fn check_position_limits(
    sub: &CopySubscription,
    copy_quantity: Decimal,
    leader_price: Decimal,
    current_exposure: Decimal,
) -> Result<Decimal, SkipReason> {
    // 4. Sizing produced nothing worth placing
    if copy_quantity <= Decimal::ZERO {
        return Err(SkipReason::QuantityTooSmall);
    }

    let position_value = copy_quantity * leader_price;

    // 5. Per-position cap
    if position_value > sub.max_position_size {
        return Err(SkipReason::PositionSizeExceeded);
    }

    // 6. Account-wide exposure cap
    if current_exposure + position_value > sub.max_total_exposure {
        return Err(SkipReason::ExposureExceeded);
    }

    Ok(position_value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
