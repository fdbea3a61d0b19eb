//! Pairwise-complete Pearson correlation of daily returns.

use std::collections::{BTreeMap, BTreeSet};

use marketlens_core::{stats, Symbol, TradeDate, Universe};
use serde::{Deserialize, Serialize};

use crate::AnalyticsError;

/// Square correlation matrix in ticker order.
///
/// `None` marks pairs with fewer than two common returns or a constant side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub tickers: Vec<Symbol>,
    pub values: Vec<Vec<Option<f64>>>,
    /// Requested tickers absent from the universe.
    pub skipped: Vec<Symbol>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &Symbol, b: &Symbol) -> Option<f64> {
        let i = self.tickers.iter().position(|symbol| symbol == a)?;
        let j = self.tickers.iter().position(|symbol| symbol == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationAnalyzer;

impl CorrelationAnalyzer {
    pub const fn new() -> Self {
        Self
    }

    /// # Errors
    /// [`AnalyticsError::InvalidInput`] when no tickers are requested.
    pub fn correlation(
        &self,
        universe: &Universe,
        tickers: &[Symbol],
    ) -> Result<CorrelationMatrix, AnalyticsError> {
        if tickers.is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "correlation needs at least one ticker".to_owned(),
            ));
        }

        let mut seen = BTreeSet::new();
        let mut included = Vec::new();
        let mut columns: Vec<BTreeMap<TradeDate, f64>> = Vec::new();
        let mut skipped = Vec::new();
        for symbol in tickers {
            if !seen.insert(symbol) {
                continue;
            }
            match universe.get(symbol) {
                Some(record) => {
                    included.push(symbol.clone());
                    columns.push(record.series.returns().collect());
                }
                None => skipped.push(symbol.clone()),
            }
        }

        let n = included.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            values[i][i] = self_correlation(&columns[i]);
            for j in (i + 1)..n {
                let value = pairwise(&columns[i], &columns[j]);
                values[i][j] = value;
                values[j][i] = value;
            }
        }

        Ok(CorrelationMatrix {
            tickers: included,
            values,
            skipped,
        })
    }
}

fn self_correlation(column: &BTreeMap<TradeDate, f64>) -> Option<f64> {
    let values: Vec<f64> = column.values().copied().collect();
    stats::sample_variance(&values)
        .filter(|variance| *variance > 0.0)
        .map(|_| 1.0)
}

fn pairwise(a: &BTreeMap<TradeDate, f64>, b: &BTreeMap<TradeDate, f64>) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .filter_map(|(date, x)| b.get(date).map(|y| (*x, *y)))
        .unzip();
    stats::pearson(&xs, &ys)
}
