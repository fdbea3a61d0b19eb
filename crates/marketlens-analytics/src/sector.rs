//! Equal-weighted sector performance.

use std::collections::BTreeMap;

use marketlens_core::{SectorMap, Symbol, TickerRecord, TradeDate, Universe};
use serde::{Deserialize, Serialize};

use crate::performance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerReturn {
    pub symbol: Symbol,
    pub total_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub sector: String,
    pub ticker_count: usize,
    pub tickers: Vec<Symbol>,
    /// Dates with at least one member return.
    pub observations: usize,
    pub annual_return: Option<f64>,
    pub annual_volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    /// Sum of the market caps members report; `None` when none do.
    pub total_market_cap: Option<f64>,
    pub best_performer: Option<TickerReturn>,
    pub worst_performer: Option<TickerReturn>,
}

/// Groups universe members by sector.
///
/// By default the sector stored on each record is used. With a
/// [`SectorMap`] members are reclassified first.
#[derive(Debug, Clone, Default)]
pub struct SectorAggregator {
    sectors: Option<SectorMap>,
}

impl SectorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_map(sectors: SectorMap) -> Self {
        Self {
            sectors: Some(sectors),
        }
    }

    pub fn aggregate(&self, universe: &Universe) -> BTreeMap<String, SectorPerformance> {
        let mut members: BTreeMap<String, Vec<&TickerRecord>> = BTreeMap::new();
        for record in universe.records() {
            let sector = match &self.sectors {
                Some(map) => map.classify(record.symbol.as_str()).to_owned(),
                None => record.sector.clone(),
            };
            members.entry(sector).or_default().push(record);
        }

        members
            .into_iter()
            .map(|(sector, records)| {
                let performance = summarize(&sector, &records);
                (sector, performance)
            })
            .collect()
    }
}

fn summarize(sector: &str, records: &[&TickerRecord]) -> SectorPerformance {
    let mut by_date: BTreeMap<TradeDate, (f64, usize)> = BTreeMap::new();
    for record in records {
        for (date, value) in record.series.returns() {
            let entry = by_date.entry(date).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    let averaged: Vec<f64> = by_date
        .values()
        .map(|(sum, count)| sum / *count as f64)
        .collect();

    let annual_return = performance::annual_return(&averaged);
    let annual_volatility = performance::annual_volatility(&averaged);
    let sharpe_ratio = annual_return
        .zip(annual_volatility)
        .and_then(|(ret, vol)| performance::sharpe_ratio(ret, vol));

    let caps: Vec<f64> = records
        .iter()
        .filter_map(|record| record.reference.market_cap())
        .collect();
    let total_market_cap = (!caps.is_empty()).then(|| caps.iter().sum());

    let mut performers: Vec<TickerReturn> = records
        .iter()
        .filter_map(|record| {
            price_return(record).map(|total_return| TickerReturn {
                symbol: record.symbol.clone(),
                total_return,
            })
        })
        .collect();
    performers.sort_by(|a, b| a.total_return.total_cmp(&b.total_return));

    SectorPerformance {
        sector: sector.to_owned(),
        ticker_count: records.len(),
        tickers: records.iter().map(|record| record.symbol.clone()).collect(),
        observations: averaged.len(),
        annual_return,
        annual_volatility,
        sharpe_ratio,
        total_market_cap,
        worst_performer: performers.first().cloned(),
        best_performer: performers.last().cloned(),
    }
}

/// `(last - first) / first` over closes; undefined for a zero first close.
pub(crate) fn price_return(record: &TickerRecord) -> Option<f64> {
    let first = record.series.first()?.close();
    let last = record.series.last()?.close();
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first)
}

/// Sector performance grouped by each record's stored sector.
pub fn sector_performance(universe: &Universe) -> BTreeMap<String, SectorPerformance> {
    SectorAggregator::new().aggregate(universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, universe};
    use marketlens_core::{ReferenceInfo, SectorGroup};

    #[test]
    fn averages_members_equally_per_date() {
        let universe = universe(vec![
            record("AAPL", "Technology", "2024-01-01", &[100.0, 110.0, 121.0]),
            record("MSFT", "Technology", "2024-01-01", &[100.0, 90.0, 81.0]),
            record("XOM", "Energy", "2024-01-01", &[50.0, 55.0, 60.5]),
        ]);

        let sectors = sector_performance(&universe);

        let tech = &sectors["Technology"];
        assert_eq!(tech.ticker_count, 2);
        assert_eq!(tech.observations, 2);
        assert!(tech.annual_return.expect("defined").abs() < 1e-9);
        assert_eq!(tech.best_performer.as_ref().map(|p| p.symbol.as_str()), Some("AAPL"));
        assert_eq!(tech.worst_performer.as_ref().map(|p| p.symbol.as_str()), Some("MSFT"));

        let energy = &sectors["Energy"];
        assert!((energy.annual_return.expect("defined") - 0.1 * 252.0).abs() < 1e-9);
        assert_eq!(energy.sharpe_ratio, None);
    }

    #[test]
    fn market_cap_sums_reported_values_only() {
        let mut apple = record("AAPL", "Technology", "2024-01-01", &[1.0, 2.0]);
        apple.reference = ReferenceInfo::new().with(ReferenceInfo::MARKET_CAP, 3.0e12);
        let mut microsoft = record("MSFT", "Technology", "2024-01-01", &[1.0, 2.0]);
        microsoft.reference = ReferenceInfo::new().with(ReferenceInfo::MARKET_CAP, 2.5e12);
        let universe = universe(vec![
            apple,
            microsoft,
            record("NVDA", "Technology", "2024-01-01", &[1.0, 2.0]),
            record("XOM", "Energy", "2024-01-01", &[1.0, 2.0]),
        ]);

        let sectors = sector_performance(&universe);

        assert_eq!(sectors["Technology"].total_market_cap, Some(5.5e12));
        assert_eq!(sectors["Energy"].total_market_cap, None);
    }

    #[test]
    fn explicit_map_reclassifies_members() {
        let universe = universe(vec![
            record("AAPL", "Technology", "2024-01-01", &[1.0, 2.0]),
            record("XOM", "Energy", "2024-01-01", &[1.0, 2.0]),
        ]);
        let map = SectorMap::new(vec![SectorGroup::new("Mega Cap", ["AAPL"])]);

        let sectors = SectorAggregator::with_map(map).aggregate(&universe);

        assert_eq!(sectors.keys().collect::<Vec<_>>(), vec!["Mega Cap", "Other"]);
    }
}
