//! Annualization and wealth-curve helpers shared by the analyzers.

use marketlens_core::stats;

/// Trading sessions per year used for every annualization.
pub const TRADING_DAYS: f64 = 252.0;

pub fn annual_return(returns: &[f64]) -> Option<f64> {
    stats::mean(returns).map(|mean| mean * TRADING_DAYS)
}

pub fn annual_volatility(returns: &[f64]) -> Option<f64> {
    stats::sample_std(returns).map(|std| std * TRADING_DAYS.sqrt())
}

/// `annual_return / annual_volatility`, undefined for zero or non-finite volatility.
pub fn sharpe_ratio(annual_return: f64, annual_volatility: f64) -> Option<f64> {
    if !annual_volatility.is_finite() || annual_volatility <= 0.0 {
        return None;
    }
    let ratio = annual_return / annual_volatility;
    ratio.is_finite().then_some(ratio)
}

/// Compounded wealth `W[t] = Π(1 + r)` starting from 1.
pub fn wealth_curve(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0_f64, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

/// Deepest peak-to-trough decline of the wealth curve. Never positive.
///
/// The running peak starts at the first wealth value, so the drawdown is 0
/// on the first day.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for wealth in wealth_curve(returns) {
        peak = peak.max(wealth);
        if peak > 0.0 {
            worst = worst.min((wealth - peak) / peak);
        }
    }
    worst.min(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wealth_curve_compounds() {
        let curve = wealth_curve(&[0.10, -0.10]);
        assert!((curve[0] - 1.10).abs() < 1e-12);
        assert!((curve[1] - 0.99).abs() < 1e-12);
    }

    #[test]
    fn drawdown_is_zero_for_rising_wealth() {
        assert_eq!(max_drawdown(&[0.01, 0.02, 0.0, 0.03]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn drawdown_measures_from_running_peak() {
        // 1.0 -> 1.2 -> 0.9 -> 1.0
        let drawdown = max_drawdown(&[0.2, -0.25, 1.0 / 9.0]);
        assert!((drawdown + 0.25).abs() < 1e-12);
    }

    #[test]
    fn first_day_loss_sets_the_initial_peak() {
        // 0.9 -> 0.945 never falls below its running peak
        assert_eq!(max_drawdown(&[-0.1, 0.05]), 0.0);

        // 0.9 -> 0.81
        let drawdown = max_drawdown(&[-0.1, -0.1]);
        assert!((drawdown + 0.1).abs() < 1e-12);
    }

    #[test]
    fn sharpe_is_undefined_without_volatility() {
        assert_eq!(sharpe_ratio(0.1, 0.0), None);
        assert_eq!(sharpe_ratio(0.1, f64::NAN), None);
        assert_eq!(sharpe_ratio(0.2, 0.1), Some(2.0));
    }
}
