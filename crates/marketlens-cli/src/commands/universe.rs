use serde::Serialize;
use serde_json::Value;

use marketlens_core::{HistoryPeriod, Symbol, TradeDate, UtcDateTime};
use marketlens_engine::Engine;

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct UniverseEntry {
    symbol: Symbol,
    sector: String,
    name: Option<String>,
    rows: usize,
    first_date: Option<TradeDate>,
    last_date: Option<TradeDate>,
}

#[derive(Debug, Serialize)]
struct UniverseResponseData {
    period: HistoryPeriod,
    collected_at: UtcDateTime,
    source: &'static str,
    tickers: Vec<UniverseEntry>,
}

pub fn run(engine: &Engine) -> Result<Value, CliError> {
    let universe = engine.universe()?;
    let meta = universe.meta();

    let tickers = universe
        .records()
        .map(|record| UniverseEntry {
            symbol: record.symbol.clone(),
            sector: record.sector.clone(),
            name: record.reference.name().map(str::to_owned),
            rows: record.series.len(),
            first_date: record.series.first().map(|row| row.date()),
            last_date: record.series.last().map(|row| row.date()),
        })
        .collect();

    Ok(serde_json::to_value(UniverseResponseData {
        period: meta.period,
        collected_at: meta.collected_at,
        source: engine.source_name(),
        tickers,
    })?)
}
