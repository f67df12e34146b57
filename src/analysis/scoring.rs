use crate::models::{PatternScores, TradingPatternFeatures};

/// Self-trade ratio above which wash-trading signals accrue.
pub const SELF_TRADE_RATIO_THRESHOLD: f64 = 0.1;
/// Round-trip ratio above which churn counts against the trader.
pub const ROUND_TRIP_RATIO_THRESHOLD: f64 = 0.3;
/// Gap stddev below which timing looks machine-driven, milliseconds.
pub const BOT_TIMING_STDDEV_MS: f64 = 100.0;
/// Order-size coefficient of variation below which sizing looks scripted.
pub const BOT_SIZE_CV_THRESHOLD: f64 = 0.1;
/// Manipulation score above which it contributes alert confidence.
pub const MANIPULATION_SCORE_THRESHOLD: f64 = 0.5;
/// Accumulated confidence a check must clear to raise an alert.
pub const ALERT_CONFIDENCE_FLOOR: f64 = 0.3;
/// Trade count at which results stop being attributable to luck.
pub const LUCK_SATURATION_TRADES: f64 = 500.0;

/// All four composite scores for one feature set, each in [0, 1].
pub fn score_patterns(features: &TradingPatternFeatures) -> PatternScores {
    let manipulation = manipulation_score(features);
    let alpha = (1.0 - manipulation * 0.5).max(0.0);
    let luck = (1.0 - (features.total_trades as f64 / LUCK_SATURATION_TRADES).min(1.0)).max(0.0);
    let skill = (alpha - luck).max(0.0);

    PatternScores {
        manipulation,
        alpha,
        luck,
        skill,
    }
}

/// Weighted sum of wash-trading signals, clamped to [0, 1].
///
/// Self-trading and round-trip churn count only past their thresholds;
/// sub-100ms timing regularity adds a fixed bump.
pub fn manipulation_score(features: &TradingPatternFeatures) -> f64 {
    let mut score = 0.0;

    if features.self_trade_ratio > SELF_TRADE_RATIO_THRESHOLD {
        score += 2.0 * features.self_trade_ratio;
    }
    if features.round_trip_ratio > ROUND_TRIP_RATIO_THRESHOLD {
        score += 1.5 * features.round_trip_ratio;
    }
    if features.trade_gap_stddev_ms < BOT_TIMING_STDDEV_MS {
        score += 0.2;
    }

    score.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// A benign feature set; tests override the field under scrutiny.
    fn make_features() -> TradingPatternFeatures {
        TradingPatternFeatures {
            total_trades: 50,
            trade_gap_mean_ms: 120_000.0,
            trade_gap_stddev_ms: 45_000.0,
            peak_trading_hours: vec![14, 15, 9],
            order_size_mean: 1_000.0,
            order_size_stddev: 400.0,
            order_size_median: 900.0,
            self_trade_ratio: 0.0,
            round_trip_ratio: 0.0,
            consecutive_same_side_ratio: 0.5,
        }
    }

    #[test]
    fn test_clean_trader() {
        let scores = score_patterns(&make_features());

        assert_eq!(scores.manipulation, 0.0);
        assert_eq!(scores.alpha, 1.0);
        assert!((scores.luck - 0.9).abs() < 1e-12);
        assert!((scores.skill - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let mut features = make_features();
        features.self_trade_ratio = 0.1;
        features.round_trip_ratio = 0.3;

        assert_eq!(manipulation_score(&features), 0.0);
    }

    #[test]
    fn test_self_trading_weighs_double() {
        let mut features = make_features();
        features.self_trade_ratio = 0.25;

        assert!((manipulation_score(&features) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_manipulation_clamped_to_one() {
        let mut features = make_features();
        features.self_trade_ratio = 0.5;
        features.round_trip_ratio = 0.5;

        // 2 x 0.5 + 1.5 x 0.5 = 1.75 before the clamp.
        assert_eq!(manipulation_score(&features), 1.0);
    }

    #[test]
    fn test_timing_regularity_bump() {
        let mut features = make_features();
        features.trade_gap_stddev_ms = 50.0;

        assert!((manipulation_score(&features) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_luck_decays_with_volume() {
        let mut features = make_features();

        features.total_trades = 0;
        assert_eq!(score_patterns(&features).luck, 1.0);

        features.total_trades = 250;
        assert!((score_patterns(&features).luck - 0.5).abs() < 1e-12);

        features.total_trades = 500;
        assert_eq!(score_patterns(&features).luck, 0.0);

        features.total_trades = 2_000;
        assert_eq!(score_patterns(&features).luck, 0.0);
    }

    #[test]
    fn test_skill_never_negative() {
        let mut features = make_features();
        features.total_trades = 10;
        features.self_trade_ratio = 0.5;

        let scores = score_patterns(&features);
        assert_eq!(scores.skill, 0.0);
    }
}
