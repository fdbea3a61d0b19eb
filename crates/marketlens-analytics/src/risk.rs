//! Distributional risk metrics of a daily return series.

use marketlens_core::{stats, EnrichedSeries};
use serde::{Deserialize, Serialize};

use crate::performance::{self, TRADING_DAYS};
use crate::AnalyticsError;

/// Smallest sample the analyzer accepts.
pub const MIN_OBSERVATIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub observations: usize,
    pub annual_return: f64,
    /// Annualized sample standard deviation.
    pub volatility: f64,
    pub var_95: f64,
    pub var_99: f64,
    pub cvar_95: f64,
    pub cvar_99: f64,
    pub skewness: Option<f64>,
    /// Excess kurtosis.
    pub kurtosis: Option<f64>,
    pub max_daily_loss: f64,
    pub max_daily_gain: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAnalyzer;

impl RiskAnalyzer {
    pub const fn new() -> Self {
        Self
    }

    /// Computes risk metrics over `returns` in chronological order.
    ///
    /// # Errors
    /// [`AnalyticsError::InsufficientData`] below [`MIN_OBSERVATIONS`];
    /// [`AnalyticsError::InvalidInput`] for non-finite returns.
    pub fn analyze(&self, returns: &[f64]) -> Result<RiskMetrics, AnalyticsError> {
        if returns.len() < MIN_OBSERVATIONS {
            return Err(AnalyticsError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: returns.len(),
            });
        }
        if let Some(index) = returns.iter().position(|value| !value.is_finite()) {
            return Err(AnalyticsError::InvalidInput(format!(
                "return at position {index} is not finite"
            )));
        }

        let insufficient = || AnalyticsError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: returns.len(),
        };
        let mean = stats::mean(returns).ok_or_else(insufficient)?;
        let std = stats::sample_std(returns).ok_or_else(insufficient)?;
        let var_95 = stats::percentile_linear(returns, 5.0).ok_or_else(insufficient)?;
        let var_99 = stats::percentile_linear(returns, 1.0).ok_or_else(insufficient)?;

        Ok(RiskMetrics {
            observations: returns.len(),
            annual_return: mean * TRADING_DAYS,
            volatility: std * TRADING_DAYS.sqrt(),
            var_95,
            var_99,
            cvar_95: tail_mean(returns, var_95),
            cvar_99: tail_mean(returns, var_99),
            skewness: stats::skewness(returns),
            kurtosis: stats::excess_kurtosis(returns),
            max_daily_loss: returns.iter().copied().fold(f64::INFINITY, f64::min),
            max_daily_gain: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            max_drawdown: performance::max_drawdown(returns),
        })
    }

    /// Risk metrics over the defined daily returns of `series`.
    pub fn analyze_series(&self, series: &EnrichedSeries) -> Result<RiskMetrics, AnalyticsError> {
        self.analyze(&series.return_values())
    }
}

/// Mean of observations at or below `threshold`.
///
/// The sample minimum is always at or below any percentile of the sample,
/// so the tail is never empty for a threshold taken from `values`.
fn tail_mean(values: &[f64], threshold: f64) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|value| **value <= threshold)
        .fold((0.0, 0_usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        threshold
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [f64; 7] = [-0.05, -0.03, -0.01, 0.00, 0.01, 0.02, 0.04];

    #[test]
    fn value_at_risk_interpolates_linearly() {
        let metrics = RiskAnalyzer::new().analyze(&SAMPLE).expect("metrics");

        assert!((metrics.var_95 - (-0.044)).abs() < 1e-12);
        assert!((metrics.var_99 - (-0.0488)).abs() < 1e-12);
        assert_eq!(metrics.cvar_95, -0.05);
        assert_eq!(metrics.max_daily_loss, -0.05);
        assert_eq!(metrics.max_daily_gain, 0.04);
        assert_eq!(metrics.observations, 7);
    }

    #[test]
    fn tail_mean_includes_every_observation_at_or_below_threshold() {
        assert!((tail_mean(&SAMPLE, -0.01) - (-0.03)).abs() < 1e-12);
    }

    #[test]
    fn single_observation_is_insufficient() {
        assert_eq!(
            RiskAnalyzer::new().analyze(&[0.01]),
            Err(AnalyticsError::InsufficientData {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn higher_moments_need_enough_observations() {
        let metrics = RiskAnalyzer::new().analyze(&[0.01, -0.02]).expect("metrics");
        assert_eq!(metrics.skewness, None);
        assert_eq!(metrics.kurtosis, None);

        let metrics = RiskAnalyzer::new().analyze(&[0.01, -0.02, 0.03]).expect("metrics");
        assert!(metrics.skewness.is_some());
        assert_eq!(metrics.kurtosis, None);
    }

    #[test]
    fn constant_returns_have_zero_volatility_and_no_moments() {
        let metrics = RiskAnalyzer::new().analyze(&[0.0; 10]).expect("metrics");
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.skewness, None);
        assert_eq!(metrics.kurtosis, None);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn non_finite_returns_are_rejected() {
        assert!(matches!(
            RiskAnalyzer::new().analyze(&[0.01, f64::NAN]),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }
}
