//! Weighted portfolio performance over inner-joined daily returns.

use std::collections::{BTreeMap, BTreeSet};

use marketlens_core::{Symbol, TradeDate, Universe};
use serde::{Deserialize, Serialize};

use crate::performance::{self, TRADING_DAYS};
use crate::risk::MIN_OBSERVATIONS;
use crate::AnalyticsError;

/// Tickers and optional parallel weights.
///
/// Weights need not sum to one. Without weights every requested ticker gets
/// `1 / tickers.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSpec {
    pub tickers: Vec<Symbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
}

impl PortfolioSpec {
    pub fn equal_weight(tickers: Vec<Symbol>) -> Self {
        Self {
            tickers,
            weights: None,
        }
    }

    pub fn weighted(tickers: Vec<Symbol>, weights: Vec<f64>) -> Self {
        Self {
            tickers,
            weights: Some(weights),
        }
    }

    /// Validated `(ticker, weight)` pairs in request order.
    fn resolve_weights(&self) -> Result<Vec<(Symbol, f64)>, AnalyticsError> {
        if self.tickers.is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "portfolio needs at least one ticker".to_owned(),
            ));
        }

        let mut seen = BTreeSet::new();
        if let Some(duplicate) = self.tickers.iter().find(|symbol| !seen.insert(*symbol)) {
            return Err(AnalyticsError::InvalidInput(format!(
                "ticker '{duplicate}' appears more than once"
            )));
        }

        let weights = match &self.weights {
            Some(weights) if weights.len() != self.tickers.len() => {
                return Err(AnalyticsError::InvalidInput(format!(
                    "{} weights given for {} tickers",
                    weights.len(),
                    self.tickers.len()
                )));
            }
            Some(weights) => {
                if let Some(bad) = weights.iter().find(|weight| !weight.is_finite()) {
                    return Err(AnalyticsError::InvalidInput(format!(
                        "weight {bad} is not finite"
                    )));
                }
                weights.clone()
            }
            None => vec![1.0 / self.tickers.len() as f64; self.tickers.len()],
        };

        Ok(self.tickers.iter().cloned().zip(weights).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHolding {
    pub symbol: Symbol,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub holdings: Vec<PortfolioHolding>,
    /// Requested tickers absent from the universe.
    pub skipped: Vec<Symbol>,
    pub observations: usize,
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub total_return: f64,
    pub returns: Vec<(TradeDate, f64)>,
    /// Wealth curve starting from 1.
    pub cumulative: Vec<(TradeDate, f64)>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioAnalyzer;

impl PortfolioAnalyzer {
    pub const fn new() -> Self {
        Self
    }

    /// # Errors
    /// [`AnalyticsError::InvalidInput`] for malformed specs;
    /// [`AnalyticsError::InsufficientData`] when no requested ticker is in
    /// the universe or fewer than two dates carry a return for all of them.
    pub fn analyze(
        &self,
        universe: &Universe,
        spec: &PortfolioSpec,
    ) -> Result<PortfolioMetrics, AnalyticsError> {
        let mut holdings = Vec::new();
        let mut skipped = Vec::new();
        for (symbol, weight) in spec.resolve_weights()? {
            if universe.contains(&symbol) {
                holdings.push(PortfolioHolding { symbol, weight });
            } else {
                skipped.push(symbol);
            }
        }
        if holdings.is_empty() {
            return Err(AnalyticsError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let returns = aligned_portfolio_returns(universe, &holdings);
        if returns.len() < MIN_OBSERVATIONS {
            return Err(AnalyticsError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: returns.len(),
            });
        }

        let values: Vec<f64> = returns.iter().map(|(_, value)| *value).collect();
        let insufficient = || AnalyticsError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: values.len(),
        };
        let annual_return = performance::annual_return(&values).ok_or_else(insufficient)?;
        let annual_volatility = performance::annual_volatility(&values).ok_or_else(insufficient)?;
        let wealth = performance::wealth_curve(&values);
        let total_return = wealth.last().map_or(0.0, |last| last - 1.0);

        let cumulative = returns
            .iter()
            .zip(&wealth)
            .map(|((date, _), wealth)| (*date, *wealth))
            .collect();

        Ok(PortfolioMetrics {
            holdings,
            skipped,
            observations: values.len(),
            annual_return,
            annual_volatility,
            sharpe_ratio: performance::sharpe_ratio(annual_return, annual_volatility),
            max_drawdown: performance::max_drawdown(&values),
            total_return,
            returns,
            cumulative,
        })
    }
}

/// `Σ w_i r_i[t]` over dates where every holding has a return.
fn aligned_portfolio_returns(
    universe: &Universe,
    holdings: &[PortfolioHolding],
) -> Vec<(TradeDate, f64)> {
    let columns: Vec<(f64, BTreeMap<TradeDate, f64>)> = holdings
        .iter()
        .filter_map(|holding| {
            universe
                .get(&holding.symbol)
                .map(|record| (holding.weight, record.series.returns().collect()))
        })
        .collect();

    let Some((_, anchor)) = columns.first() else {
        return Vec::new();
    };

    anchor
        .keys()
        .filter_map(|date| {
            columns
                .iter()
                .map(|(weight, column)| column.get(date).map(|value| weight * value))
                .sum::<Option<f64>>()
                .map(|total| (*date, total))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, record, universe};

    fn symbols(tickers: &[&str]) -> Vec<Symbol> {
        Symbol::parse_all(tickers).expect("valid symbols")
    }

    #[test]
    fn equal_weights_cover_requested_tickers_without_renormalizing() {
        let universe = universe(vec![
            record("AAPL", "Technology", "2024-01-01", &[100.0, 110.0, 99.0]),
            record("MSFT", "Technology", "2024-01-01", &[50.0, 50.0, 55.0]),
        ]);
        let spec = PortfolioSpec::equal_weight(symbols(&["AAPL", "MSFT", "ZZZ"]));

        let metrics = PortfolioAnalyzer::new().analyze(&universe, &spec).expect("metrics");

        assert_eq!(metrics.skipped, symbols(&["ZZZ"]));
        assert_eq!(metrics.holdings.len(), 2);
        assert!((metrics.holdings[0].weight - 1.0 / 3.0).abs() < 1e-12);
        // (0.10 + 0.0) / 3 and (-0.10 + 0.10) / 3
        assert!((metrics.returns[0].1 - 0.1 / 3.0).abs() < 1e-12);
        assert!(metrics.returns[1].1.abs() < 1e-12);
    }

    #[test]
    fn returns_are_inner_joined_on_date() {
        let universe = universe(vec![
            record("AAPL", "Technology", "2024-01-01", &[100.0, 101.0, 102.0, 103.0]),
            record("MSFT", "Technology", "2024-01-02", &[50.0, 51.0, 52.0]),
        ]);
        let spec = PortfolioSpec::weighted(symbols(&["AAPL", "MSFT"]), vec![0.5, 0.5]);

        let metrics = PortfolioAnalyzer::new().analyze(&universe, &spec).expect("metrics");

        let dates: Vec<TradeDate> = metrics.returns.iter().map(|(date, _)| *date).collect();
        assert_eq!(dates, vec![date("2024-01-03"), date("2024-01-04")]);
        assert_eq!(metrics.cumulative.len(), 2);
    }

    #[test]
    fn weight_count_must_match_tickers() {
        let universe = universe(vec![record("AAPL", "Technology", "2024-01-01", &[1.0, 2.0, 3.0])]);
        let spec = PortfolioSpec::weighted(symbols(&["AAPL"]), vec![0.5, 0.5]);

        assert!(matches!(
            PortfolioAnalyzer::new().analyze(&universe, &spec),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }

    #[test]
    fn duplicate_tickers_are_rejected() {
        let universe = universe(vec![record("AAPL", "Technology", "2024-01-01", &[1.0, 2.0, 3.0])]);
        let spec = PortfolioSpec::equal_weight(symbols(&["AAPL", "aapl"]));

        assert!(matches!(
            PortfolioAnalyzer::new().analyze(&universe, &spec),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }

    #[test]
    fn only_unknown_tickers_is_insufficient_data() {
        let universe = universe(vec![record("AAPL", "Technology", "2024-01-01", &[1.0, 2.0, 3.0])]);
        let spec = PortfolioSpec::equal_weight(symbols(&["ZZZ"]));

        assert_eq!(
            PortfolioAnalyzer::new().analyze(&universe, &spec),
            Err(AnalyticsError::InsufficientData {
                required: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn flat_portfolio_has_no_sharpe_ratio() {
        let universe = universe(vec![record("KO", "Consumer Staples", "2024-01-01", &[60.0; 5])]);
        let spec = PortfolioSpec::equal_weight(symbols(&["KO"]));

        let metrics = PortfolioAnalyzer::new().analyze(&universe, &spec).expect("metrics");

        assert_eq!(metrics.annual_volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, None);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.total_return, 0.0);
    }
}
