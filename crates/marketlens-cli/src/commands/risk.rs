use serde::Serialize;
use serde_json::Value;

use marketlens_analytics::RiskMetrics;
use marketlens_core::Symbol;
use marketlens_engine::Engine;

use crate::cli::TickerArgs;
use crate::error::CliError;

use super::parse_symbol;

#[derive(Debug, Serialize)]
struct RiskResponseData {
    symbol: Symbol,
    risk: RiskMetrics,
}

pub fn run(args: &TickerArgs, engine: &Engine) -> Result<Value, CliError> {
    let symbol = parse_symbol(&args.ticker)?;
    let risk = engine.get_risk_metrics(&symbol)?;
    Ok(serde_json::to_value(RiskResponseData { symbol, risk })?)
}
