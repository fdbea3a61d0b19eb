use serde::Serialize;
use serde_json::Value;

use marketlens_analytics::MonthlyReturn;
use marketlens_core::Symbol;
use marketlens_engine::Engine;

use crate::cli::TickerArgs;
use crate::error::CliError;

use super::parse_symbol;

#[derive(Debug, Serialize)]
struct MonthlyResponseData {
    symbol: Symbol,
    months: Vec<MonthlyReturn>,
}

pub fn run(args: &TickerArgs, engine: &Engine) -> Result<Value, CliError> {
    let symbol = parse_symbol(&args.ticker)?;
    let months = engine.get_monthly_returns(&symbol)?;
    Ok(serde_json::to_value(MonthlyResponseData { symbol, months })?)
}
