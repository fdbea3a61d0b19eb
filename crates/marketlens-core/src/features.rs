//! Per-ticker feature pipeline.
//!
//! Every feature uses a trailing fixed-width window; a row whose window is
//! not yet full gets `None`. With `n` the row index:
//!
//! | Feature | Window | First defined row |
//! |---------|--------|-------------------|
//! | `daily_return` | 2 closes | 1 |
//! | `volatility_30` | 30 returns | 30 |
//! | `ma_20` | 20 closes | 19 |
//! | `ma_50` | 50 closes | 49 |
//! | `rsi_14` | 14 price changes | 14 |

use thiserror::Error;

use crate::{ensure_strictly_increasing, stats, Bar, EnrichedRow, EnrichedSeries, ValidationError};

pub const VOLATILITY_WINDOW: usize = 30;
pub const SHORT_MA_WINDOW: usize = 20;
pub const LONG_MA_WINDOW: usize = 50;
pub const RSI_WINDOW: usize = 14;

/// Neutral RSI reported for a window without any price change.
pub const FLAT_RSI: f64 = 50.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("cannot derive features from an empty bar sequence")]
    EmptySeries,
    #[error("bar dates must be strictly increasing (violated at row {index})")]
    UnorderedDates { index: usize },
    #[error(transparent)]
    Validation(ValidationError),
}

/// Derives [`EnrichedSeries`] rows from raw daily bars.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub const fn new() -> Self {
        Self
    }

    /// Enriches `bars`, which must be non-empty and strictly date-ordered.
    ///
    /// # Errors
    /// [`FeatureError::EmptySeries`] or [`FeatureError::UnorderedDates`].
    pub fn build(&self, bars: &[Bar]) -> Result<EnrichedSeries, FeatureError> {
        if bars.is_empty() {
            return Err(FeatureError::EmptySeries);
        }
        ensure_strictly_increasing(bars.iter().map(|bar| bar.date)).map_err(unordered)?;

        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        let returns = daily_returns(&closes);
        let volatility = rolling_volatility(&returns, VOLATILITY_WINDOW);
        let ma_short = moving_average(&closes, SHORT_MA_WINDOW);
        let ma_long = moving_average(&closes, LONG_MA_WINDOW);
        let rsi = relative_strength_index(&closes, RSI_WINDOW);

        let rows = bars
            .iter()
            .enumerate()
            .map(|(index, bar)| EnrichedRow {
                bar: *bar,
                daily_return: returns[index],
                volatility_30: volatility[index],
                ma_20: ma_short[index],
                ma_50: ma_long[index],
                rsi_14: rsi[index],
            })
            .collect();

        EnrichedSeries::new(rows).map_err(unordered)
    }
}

fn unordered(error: ValidationError) -> FeatureError {
    match error {
        ValidationError::UnorderedSeries { index } => FeatureError::UnorderedDates { index },
        other => FeatureError::Validation(other),
    }
}

/// `close[t] / close[t-1] - 1`; undefined on the first row and after a zero close.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(closes.len());
    for (index, close) in closes.iter().enumerate() {
        let value = match index.checked_sub(1).map(|prev| closes[prev]) {
            Some(previous) if previous != 0.0 => Some(close / previous - 1.0),
            _ => None,
        };
        returns.push(value);
    }
    returns
}

/// Sample standard deviation of the trailing `window` returns.
///
/// A window containing an undefined return stays undefined.
pub fn rolling_volatility(returns: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; returns.len()];
    if window == 0 {
        return out;
    }
    for end in window..=returns.len() {
        let slice = &returns[end - window..end];
        let values: Option<Vec<f64>> = slice.iter().copied().collect();
        out[end - 1] = values.and_then(|values| stats::sample_std(&values));
    }
    out
}

/// Simple moving average of the trailing `window` closes.
pub fn moving_average(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || closes.len() < window {
        return out;
    }
    let mut sum: f64 = closes[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);
    for end in window..closes.len() {
        sum += closes[end] - closes[end - window];
        out[end] = Some(sum / window as f64);
    }
    out
}

/// RSI from simple trailing means of gains and losses.
///
/// A window with no losses saturates at 100; a window with neither gains
/// nor losses reports [`FLAT_RSI`].
pub fn relative_strength_index(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || closes.len() <= window {
        return out;
    }

    let diffs: Vec<f64> = closes.windows(2).map(|pair| pair[1] - pair[0]).collect();
    for end in window..=diffs.len() {
        let changes = &diffs[end - window..end];
        let avg_gain = changes.iter().map(|d| d.max(0.0)).sum::<f64>() / window as f64;
        let avg_loss = changes.iter().map(|d| (-d).max(0.0)).sum::<f64>() / window as f64;

        let rsi = if avg_loss == 0.0 {
            if avg_gain > 0.0 {
                100.0
            } else {
                FLAT_RSI
            }
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
        // diff index `end - 1` belongs to row `end`
        out[end] = Some(rsi.clamp(0.0, 100.0));
    }
    out
}
