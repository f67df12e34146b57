use serde::{Deserialize, Serialize};

/// Descriptive statistics for one trader's analysis window.
///
/// Derived per run and returned in API responses; never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingPatternFeatures {
    pub total_trades: usize,
    /// Mean gap between consecutive trades, milliseconds.
    pub trade_gap_mean_ms: f64,
    /// Population stddev of consecutive gaps, milliseconds.
    pub trade_gap_stddev_ms: f64,
    /// Top 3 UTC hours by trade count (count desc, hour asc tie-break).
    pub peak_trading_hours: Vec<u32>,
    pub order_size_mean: f64,
    pub order_size_stddev: f64,
    pub order_size_median: f64,
    /// Fraction of trades where the counterparty is the trader themself.
    pub self_trade_ratio: f64,
    /// Fraction of trades that close a same-symbol buy within one hour.
    pub round_trip_ratio: f64,
    /// Fraction of adjacent trade pairs on the same side.
    pub consecutive_same_side_ratio: f64,
}

/// Composite scores in [0, 1] derived from the feature set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PatternScores {
    pub manipulation: f64,
    pub alpha: f64,
    pub luck: f64,
    pub skill: f64,
}
