//! Behavior-driven tests for the feature pipeline
//!
//! These tests verify WHAT an enriched series looks like for realistic and
//! degenerate price histories: warm-up markers, known values and bounds.

use marketlens_core::features::{LONG_MA_WINDOW, RSI_WINDOW, SHORT_MA_WINDOW, VOLATILITY_WINDOW};
use marketlens_core::{
    Bar, FeatureBuilder, FeatureError, HistoryPeriod, Symbol, SyntheticSource, TradeDate,
};

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let mut date = TradeDate::parse("2024-01-02").expect("valid date");
    closes
        .iter()
        .map(|close| {
            let bar = Bar::new(date, *close, *close, *close, *close, 10_000).expect("valid bar");
            date = date.next_weekday();
            bar
        })
        .collect()
}

// =============================================================================
// Feature Pipeline: Known Values
// =============================================================================

#[test]
fn when_prices_are_known_returns_match_hand_calculation() {
    // Given: Five closes
    let bars = bars_from_closes(&[100.0, 102.0, 101.0, 105.0, 103.0]);

    // When: The series is enriched
    let series = FeatureBuilder::new().build(&bars).expect("enriched");

    // Then: Returns match close[t]/close[t-1] - 1 and the first is undefined
    let returns: Vec<Option<f64>> = series.rows().iter().map(|row| row.daily_return).collect();
    assert_eq!(returns[0], None);
    let expected = [0.02, -0.0098, 0.0396, -0.019];
    for (actual, expected) in returns[1..].iter().zip(expected) {
        let actual = actual.expect("defined after the first row");
        assert!((actual - expected).abs() < 1e-4, "{actual} vs {expected}");
    }

    // And: Compounding the returns gives the 3% total move
    let total = series
        .return_values()
        .iter()
        .fold(1.0, |wealth, r| wealth * (1.0 + r))
        - 1.0;
    assert!((total - 0.03).abs() < 1e-12);
}

#[test]
fn when_history_is_short_every_window_feature_stays_undefined() {
    // Given: Ten bars, fewer than any indicator window
    let closes: Vec<f64> = (0..10).map(|i| 50.0 + f64::from(i)).collect();

    // When: The series is enriched
    let series = FeatureBuilder::new()
        .build(&bars_from_closes(&closes))
        .expect("enriched");

    // Then: Only returns are defined; no indicator pretends to be zero
    for row in series.rows() {
        assert!(row.volatility_30.is_none());
        assert!(row.ma_20.is_none());
        assert!(row.ma_50.is_none());
        assert!(row.rsi_14.is_none());
    }
}

// =============================================================================
// Feature Pipeline: Realistic Histories
// =============================================================================

#[test]
fn when_full_history_is_enriched_warm_up_boundaries_hold() {
    // Given: Two years of synthetic daily bars
    let history = SyntheticSource::new()
        .history(&Symbol::parse("NVDA").expect("valid"), HistoryPeriod::TwoYears)
        .expect("history");

    // When: The series is enriched
    let series = FeatureBuilder::new().build(&history.bars).expect("enriched");
    let rows = series.rows();

    // Then: Each feature becomes defined exactly at its first full window
    assert!(rows[VOLATILITY_WINDOW - 1].volatility_30.is_none());
    assert!(rows[VOLATILITY_WINDOW].volatility_30.is_some());
    assert!(rows[SHORT_MA_WINDOW - 2].ma_20.is_none());
    assert!(rows[SHORT_MA_WINDOW - 1].ma_20.is_some());
    assert!(rows[LONG_MA_WINDOW - 2].ma_50.is_none());
    assert!(rows[LONG_MA_WINDOW - 1].ma_50.is_some());
    assert!(rows[RSI_WINDOW - 1].rsi_14.is_none());
    assert!(rows[RSI_WINDOW].rsi_14.is_some());

    // And: Every defined value is within its natural range
    for row in &rows[LONG_MA_WINDOW..] {
        let rsi = row.rsi_14.expect("warm");
        assert!((0.0..=100.0).contains(&rsi));
        assert!(row.volatility_30.expect("warm") > 0.0);
        assert!(row.ma_20.expect("warm") > 0.0);
    }
}

#[test]
fn when_prices_only_rise_rsi_saturates_at_one_hundred() {
    // Given: A strictly rising price path
    let closes: Vec<f64> = (0..30).map(|i| 20.0 + f64::from(i) * 0.5).collect();

    // When: The series is enriched
    let series = FeatureBuilder::new()
        .build(&bars_from_closes(&closes))
        .expect("enriched");

    // Then: RSI is exactly 100 once defined
    for row in &series.rows()[RSI_WINDOW..] {
        assert_eq!(row.rsi_14, Some(100.0));
    }
}

// =============================================================================
// Feature Pipeline: Invalid Input
// =============================================================================

#[test]
fn when_bars_are_empty_or_unordered_builder_rejects_them() {
    // Given: An empty history and a history with a repeated date
    let builder = FeatureBuilder::new();
    let mut repeated = bars_from_closes(&[1.0, 2.0, 3.0]);
    repeated[2].date = repeated[1].date;

    // When / Then: Both are rejected with typed errors
    assert_eq!(builder.build(&[]), Err(FeatureError::EmptySeries));
    assert_eq!(
        builder.build(&repeated),
        Err(FeatureError::UnorderedDates { index: 2 })
    );
}
