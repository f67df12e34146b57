use std::collections::HashMap;
use std::collections::VecDeque;

use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::models::{TraderTrade, TradingPatternFeatures};

/// A buy can only be closed by a sell inside this window.
const ROUND_TRIP_WINDOW: Duration = Duration::hours(1);

/// Compute the full feature set over one trader's window.
///
/// `trades` must be sorted by `executed_at` ascending; the gap statistics
/// and round-trip matching both depend on that ordering.
pub fn extract_features(trader_id: Uuid, trades: &[TraderTrade]) -> TradingPatternFeatures {
    let total = trades.len();

    let gaps: Vec<f64> = trades
        .windows(2)
        .map(|w| (w[1].executed_at - w[0].executed_at).num_milliseconds() as f64)
        .collect();
    let gap_mean = mean(&gaps);

    let sizes: Vec<f64> = trades
        .iter()
        .map(|t| t.trade_value().to_f64().unwrap_or(0.0))
        .collect();
    let size_mean = mean(&sizes);

    TradingPatternFeatures {
        total_trades: total,
        trade_gap_mean_ms: gap_mean,
        trade_gap_stddev_ms: population_stddev(&gaps, gap_mean),
        peak_trading_hours: peak_trading_hours(trades),
        order_size_mean: size_mean,
        order_size_stddev: population_stddev(&sizes, size_mean),
        order_size_median: median(&sizes),
        self_trade_ratio: fraction(self_trade_ids(trader_id, trades).len(), total),
        round_trip_ratio: fraction(round_trip_closing_legs(trades).len(), total),
        consecutive_same_side_ratio: consecutive_same_side_ratio(trades),
    }
}

// ---------------------------------------------------------------------------
// Self trades
// ---------------------------------------------------------------------------

/// Ids of trades where the trader was their own counterparty.
pub fn self_trade_ids(trader_id: Uuid, trades: &[TraderTrade]) -> Vec<Uuid> {
    trades
        .iter()
        .filter(|t| t.counterparty_id == Some(trader_id))
        .map(|t| t.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

/// Ids of sells that close an earlier same-symbol buy within the window.
///
/// Greedy earliest-open matching: each sell consumes the oldest open buy
/// still inside the window, and a consumed buy cannot match again.
pub fn round_trip_closing_legs(trades: &[TraderTrade]) -> Vec<Uuid> {
    let mut open_buys: HashMap<&str, VecDeque<DateTime<Utc>>> = HashMap::new();
    let mut closing = Vec::new();

    for trade in trades {
        if trade.side.eq_ignore_ascii_case("buy") {
            open_buys
                .entry(trade.symbol.as_str())
                .or_default()
                .push_back(trade.executed_at);
        } else if trade.side.eq_ignore_ascii_case("sell") {
            let Some(opens) = open_buys.get_mut(trade.symbol.as_str()) else {
                continue;
            };
            // A buy that has aged out cannot close any later sell either.
            while opens
                .front()
                .is_some_and(|&open| trade.executed_at - open > ROUND_TRIP_WINDOW)
            {
                opens.pop_front();
            }
            if opens.pop_front().is_some() {
                closing.push(trade.id);
            }
        }
    }

    closing
}

// ---------------------------------------------------------------------------
// Timing and sizing
// ---------------------------------------------------------------------------

/// Top 3 UTC hours by trade count, ties broken by the earlier hour.
fn peak_trading_hours(trades: &[TraderTrade]) -> Vec<u32> {
    let mut counts = [0usize; 24];
    for trade in trades {
        counts[trade.executed_at.hour() as usize] += 1;
    }

    let mut hours: Vec<u32> = (0..24).filter(|&h| counts[h as usize] > 0).collect();
    hours.sort_by(|&a, &b| counts[b as usize].cmp(&counts[a as usize]).then(a.cmp(&b)));
    hours.truncate(3);
    hours
}

fn consecutive_same_side_ratio(trades: &[TraderTrade]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }

    let same = trades
        .windows(2)
        .filter(|w| w[0].side.eq_ignore_ascii_case(&w[1].side))
        .count();

    same as f64 / (trades.len() - 1) as f64
}

// ---------------------------------------------------------------------------
// Stats helpers
// ---------------------------------------------------------------------------

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by n, not n-1).
fn population_stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn trader_id() -> Uuid {
        Uuid::from_u128(0xA11CE)
    }

    /// A trade `minutes` after a fixed noon baseline, priced 1 x $100.
    fn make_trade(symbol: &str, side: &str, minutes: i64) -> TraderTrade {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        TraderTrade {
            id: Uuid::new_v4(),
            trader_id: trader_id(),
            symbol: symbol.to_string(),
            side: side.to_string(),
            asset_class: "crypto".to_string(),
            quantity: Decimal::ONE,
            price: Decimal::from(100),
            counterparty_id: None,
            executed_at: base + Duration::minutes(minutes),
            created_at: None,
        }
    }

    fn self_trade(symbol: &str, side: &str, minutes: i64) -> TraderTrade {
        let mut t = make_trade(symbol, side, minutes);
        t.counterparty_id = Some(trader_id());
        t
    }

    #[test]
    fn test_gap_stats_regular_spacing() {
        let trades: Vec<TraderTrade> = (0..4).map(|i| make_trade("BTC", "buy", i)).collect();
        let features = extract_features(trader_id(), &trades);

        assert_eq!(features.trade_gap_mean_ms, 60_000.0);
        assert_eq!(features.trade_gap_stddev_ms, 0.0);
    }

    #[test]
    fn test_empty_window_is_all_zeros() {
        let features = extract_features(trader_id(), &[]);

        assert_eq!(features.total_trades, 0);
        assert_eq!(features.trade_gap_mean_ms, 0.0);
        assert_eq!(features.order_size_median, 0.0);
        assert_eq!(features.self_trade_ratio, 0.0);
        assert!(features.peak_trading_hours.is_empty());
    }

    #[test]
    fn test_peak_hours_count_then_hour() {
        let mut trades = Vec::new();
        // Hour 9 twice, hour 12 three times, hour 13 twice, hour 15 once.
        trades.push(make_trade("BTC", "buy", -180));
        trades.push(make_trade("BTC", "buy", -179));
        trades.push(make_trade("BTC", "buy", 0));
        trades.push(make_trade("BTC", "buy", 1));
        trades.push(make_trade("BTC", "buy", 2));
        trades.push(make_trade("BTC", "buy", 60));
        trades.push(make_trade("BTC", "buy", 61));
        trades.push(make_trade("BTC", "buy", 180));
        trades.sort_by_key(|t| t.executed_at);

        let features = extract_features(trader_id(), &trades);

        // 9 and 13 tie on count; the earlier hour wins.
        assert_eq!(features.peak_trading_hours, vec![12, 9, 13]);
    }

    #[test]
    fn test_order_size_stats() {
        let mut trades: Vec<TraderTrade> = (0..4).map(|i| make_trade("BTC", "buy", i)).collect();
        trades[1].quantity = Decimal::from(2);
        trades[2].quantity = Decimal::from(3);
        trades[3].quantity = Decimal::from(4);

        let features = extract_features(trader_id(), &trades);

        // Sizes 100, 200, 300, 400.
        assert_eq!(features.order_size_mean, 250.0);
        assert_eq!(features.order_size_median, 250.0);
    }

    #[test]
    fn test_self_trade_ratio_three_of_ten() {
        let mut trades: Vec<TraderTrade> = (0..7).map(|i| make_trade("BTC", "buy", i)).collect();
        trades.push(self_trade("BTC", "sell", 7));
        trades.push(self_trade("BTC", "sell", 8));
        trades.push(self_trade("BTC", "sell", 9));

        let features = extract_features(trader_id(), &trades);
        assert_eq!(features.self_trade_ratio, 0.3);
    }

    #[test]
    fn test_self_trade_ratio_monotonic() {
        let mut trades: Vec<TraderTrade> = (0..10).map(|i| make_trade("BTC", "buy", i)).collect();
        trades[0] = self_trade("BTC", "buy", 0);
        let before = extract_features(trader_id(), &trades).self_trade_ratio;

        trades[1] = self_trade("BTC", "buy", 1);
        let after = extract_features(trader_id(), &trades).self_trade_ratio;

        assert!(after >= before);
    }

    #[test]
    fn test_round_trip_within_window() {
        let trades = vec![make_trade("BTC", "buy", 0), make_trade("BTC", "sell", 30)];
        let features = extract_features(trader_id(), &trades);
        assert_eq!(features.round_trip_ratio, 0.5);
    }

    #[test]
    fn test_round_trip_window_expired() {
        let trades = vec![make_trade("BTC", "buy", 0), make_trade("BTC", "sell", 90)];
        let features = extract_features(trader_id(), &trades);
        assert_eq!(features.round_trip_ratio, 0.0);
    }

    #[test]
    fn test_round_trip_buy_matches_once() {
        let trades = vec![
            make_trade("BTC", "buy", 0),
            make_trade("BTC", "sell", 10),
            make_trade("BTC", "sell", 20),
        ];
        let legs = round_trip_closing_legs(&trades);

        assert_eq!(legs, vec![trades[1].id]);
    }

    #[test]
    fn test_round_trip_symbols_do_not_cross() {
        let trades = vec![make_trade("BTC", "buy", 0), make_trade("ETH", "sell", 10)];
        assert!(round_trip_closing_legs(&trades).is_empty());
    }

    #[test]
    fn test_round_trip_idempotent() {
        let trades = vec![
            make_trade("BTC", "buy", 0),
            make_trade("BTC", "buy", 5),
            make_trade("BTC", "sell", 30),
            make_trade("ETH", "buy", 40),
            make_trade("BTC", "sell", 50),
        ];

        let first = extract_features(trader_id(), &trades).round_trip_ratio;
        let second = extract_features(trader_id(), &trades).round_trip_ratio;

        assert_eq!(first, second);
        assert_eq!(first, 0.4);
    }

    #[test]
    fn test_consecutive_same_side() {
        let trades = vec![
            make_trade("BTC", "buy", 0),
            make_trade("BTC", "buy", 1),
            make_trade("BTC", "sell", 2),
            make_trade("BTC", "sell", 3),
        ];
        let features = extract_features(trader_id(), &trades);

        // Pairs: buy/buy, buy/sell, sell/sell.
        assert!((features.consecutive_same_side_ratio - 2.0 / 3.0).abs() < 1e-12);
    }
}
