//! Per-company views: headline summary, risk/return scatter, monthly returns.

use marketlens_core::{Symbol, TickerRecord, TradeDate, Universe};
use serde::{Deserialize, Serialize};

use crate::performance;
use crate::sector::price_return;
use crate::AnalyticsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub symbol: Symbol,
    pub name: Option<String>,
    pub sector: String,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub first_date: TradeDate,
    pub last_date: TradeDate,
    pub last_close: f64,
    pub period_high: f64,
    pub period_low: f64,
    pub total_return: Option<f64>,
    pub annual_volatility: Option<f64>,
    pub average_volume: f64,
    pub observations: usize,
}

/// Headline figures for one company over the collected period.
///
/// # Errors
/// [`AnalyticsError::InsufficientData`] for a record without rows.
pub fn company_summary(record: &TickerRecord) -> Result<CompanySummary, AnalyticsError> {
    let rows = record.series.rows();
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            actual: 0,
        });
    };

    let closes = rows.iter().map(|row| row.close());
    let period_high = closes.clone().fold(f64::NEG_INFINITY, f64::max);
    let period_low = closes.fold(f64::INFINITY, f64::min);
    let average_volume =
        rows.iter().map(|row| row.bar.volume as f64).sum::<f64>() / rows.len() as f64;

    Ok(CompanySummary {
        symbol: record.symbol.clone(),
        name: record.reference.name().map(str::to_owned),
        sector: record.sector.clone(),
        industry: record.reference.industry().map(str::to_owned),
        market_cap: record.reference.market_cap(),
        first_date: first.date(),
        last_date: last.date(),
        last_close: last.close(),
        period_high,
        period_low,
        total_return: price_return(record),
        annual_volatility: performance::annual_volatility(&record.series.return_values()),
        average_volume,
        observations: rows.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReturnPoint {
    pub symbol: Symbol,
    pub sector: String,
    pub annual_return: f64,
    pub annual_volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReturnReport {
    pub points: Vec<RiskReturnPoint>,
    /// Unknown tickers and tickers with fewer than two returns.
    pub skipped: Vec<Symbol>,
}

/// Annualized return against volatility for each requested ticker.
///
/// An empty request covers the whole universe.
pub fn risk_return_points(universe: &Universe, tickers: &[Symbol]) -> RiskReturnReport {
    let requested: Vec<Symbol> = if tickers.is_empty() {
        universe.symbols().cloned().collect()
    } else {
        tickers.to_vec()
    };

    let mut points = Vec::new();
    let mut skipped = Vec::new();
    for symbol in requested {
        let point = universe.get(&symbol).and_then(|record| {
            let returns = record.series.return_values();
            Some(RiskReturnPoint {
                symbol: symbol.clone(),
                sector: record.sector.clone(),
                annual_return: performance::annual_return(&returns)?,
                annual_volatility: performance::annual_volatility(&returns)?,
            })
        });
        match point {
            Some(point) => points.push(point),
            None => skipped.push(symbol),
        }
    }
    RiskReturnReport { points, skipped }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u8,
    /// Last trading date in the month.
    pub month_end: TradeDate,
    pub close: f64,
    pub monthly_return: Option<f64>,
}

/// Month-end closes and month-over-month returns.
///
/// The first calendar month has no prior close and is dropped. A zero prior
/// close leaves the return undefined.
pub fn monthly_returns(record: &TickerRecord) -> Vec<MonthlyReturn> {
    let mut month_ends: Vec<(TradeDate, f64)> = Vec::new();
    for (date, close) in record.series.closes() {
        match month_ends.last_mut() {
            Some(last) if same_month(last.0, date) => *last = (date, close),
            _ => month_ends.push((date, close)),
        }
    }

    month_ends
        .windows(2)
        .map(|pair| {
            let (_, previous) = pair[0];
            let (month_end, close) = pair[1];
            MonthlyReturn {
                year: month_end.year(),
                month: month_end.month(),
                month_end,
                close,
                monthly_return: (previous != 0.0).then(|| close / previous - 1.0),
            }
        })
        .collect()
}

fn same_month(a: TradeDate, b: TradeDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
