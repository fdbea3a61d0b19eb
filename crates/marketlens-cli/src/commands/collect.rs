use serde::Serialize;
use serde_json::Value;

use marketlens_core::{CollectionReport, HistoryPeriod, UtcDateTime};
use marketlens_engine::Engine;

use crate::cli::CollectArgs;
use crate::error::CliError;

use super::parse_symbols;

#[derive(Debug, Serialize)]
struct CollectResponseData<'a> {
    snapshot: String,
    period: HistoryPeriod,
    collected_at: UtcDateTime,
    tickers: usize,
    report: &'a CollectionReport,
}

pub async fn run(args: &CollectArgs, engine: &Engine) -> Result<Value, CliError> {
    let tickers = parse_symbols(&args.tickers)?;

    let tickers = if tickers.is_empty() {
        engine.configured_tickers().to_vec()
    } else {
        tickers
    };
    let period = args.period.unwrap_or_else(|| engine.configured_period());
    let refresh = engine.recollect(&tickers, period).await?;

    let meta = refresh.universe.meta();
    Ok(serde_json::to_value(CollectResponseData {
        snapshot: engine.store().path().display().to_string(),
        period: meta.period,
        collected_at: meta.collected_at,
        tickers: refresh.universe.len(),
        report: &refresh.report,
    })?)
}
