//! Date-aligned close-price matrix across a universe.

use std::collections::{BTreeMap, BTreeSet};

use marketlens_core::{Symbol, TradeDate, Universe};
use serde::{Deserialize, Serialize};

/// Inclusive date bounds; an open side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<TradeDate>,
    pub end: Option<TradeDate>,
}

impl DateRange {
    pub const fn new(start: Option<TradeDate>, end: Option<TradeDate>) -> Self {
        Self { start, end }
    }

    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub fn contains(&self, date: TradeDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Close prices keyed by date then ticker.
///
/// Cells for tickers that did not trade on a date are absent; nothing is
/// forward-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterMatrix {
    tickers: Vec<Symbol>,
    rows: BTreeMap<TradeDate, BTreeMap<Symbol, f64>>,
}

impl MasterMatrix {
    /// Outer join of every ticker's closes on date.
    pub fn build(universe: &Universe) -> Self {
        let mut rows: BTreeMap<TradeDate, BTreeMap<Symbol, f64>> = BTreeMap::new();
        for record in universe.records() {
            for (date, close) in record.series.closes() {
                rows.entry(date)
                    .or_default()
                    .insert(record.symbol.clone(), close);
            }
        }
        Self {
            tickers: universe.symbols().cloned().collect(),
            rows,
        }
    }

    /// Restricts to dates inside `range` and, when given, to `tickers`.
    ///
    /// Requested tickers absent from the matrix are ignored. Dates left
    /// without any cell are dropped.
    pub fn slice(&self, range: DateRange, tickers: Option<&[Symbol]>) -> Self {
        let keep: BTreeSet<&Symbol> = match tickers {
            Some(requested) => requested
                .iter()
                .filter(|symbol| self.tickers.contains(symbol))
                .collect(),
            None => self.tickers.iter().collect(),
        };

        let rows = self
            .rows
            .iter()
            .filter(|(date, _)| range.contains(**date))
            .filter_map(|(date, cells)| {
                let cells: BTreeMap<Symbol, f64> = cells
                    .iter()
                    .filter(|(symbol, _)| keep.contains(symbol))
                    .map(|(symbol, close)| (symbol.clone(), *close))
                    .collect();
                (!cells.is_empty()).then_some((*date, cells))
            })
            .collect();

        Self {
            tickers: keep.into_iter().cloned().collect(),
            rows,
        }
    }

    /// Rebases every ticker so its first observed close equals `base`.
    ///
    /// Tickers whose first close is zero are dropped from the view.
    pub fn normalized(&self, base: f64) -> Self {
        let mut first: BTreeMap<&Symbol, f64> = BTreeMap::new();
        for cells in self.rows.values() {
            for (symbol, close) in cells {
                first.entry(symbol).or_insert(*close);
            }
        }
        first.retain(|_, close| *close != 0.0);

        let rows = self
            .rows
            .iter()
            .filter_map(|(date, cells)| {
                let cells: BTreeMap<Symbol, f64> = cells
                    .iter()
                    .filter_map(|(symbol, close)| {
                        first
                            .get(symbol)
                            .map(|anchor| (symbol.clone(), close / anchor * base))
                    })
                    .collect();
                (!cells.is_empty()).then_some((*date, cells))
            })
            .collect();

        Self {
            tickers: self
                .tickers
                .iter()
                .filter(|symbol| first.contains_key(symbol))
                .cloned()
                .collect(),
            rows,
        }
    }

    pub fn tickers(&self) -> &[Symbol] {
        &self.tickers
    }

    pub fn dates(&self) -> impl Iterator<Item = TradeDate> + '_ {
        self.rows.keys().copied()
    }

    pub fn row(&self, date: TradeDate) -> Option<&BTreeMap<Symbol, f64>> {
        self.rows.get(&date)
    }

    pub fn get(&self, date: TradeDate, ticker: &Symbol) -> Option<f64> {
        self.rows.get(&date).and_then(|cells| cells.get(ticker)).copied()
    }

    /// Observed closes of one ticker in date order.
    pub fn column(&self, ticker: &Symbol) -> Vec<(TradeDate, f64)> {
        self.rows
            .iter()
            .filter_map(|(date, cells)| cells.get(ticker).map(|close| (*date, *close)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
