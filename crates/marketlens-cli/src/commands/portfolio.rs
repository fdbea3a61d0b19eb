use serde_json::Value;

use marketlens_engine::Engine;

use crate::cli::PortfolioArgs;
use crate::error::CliError;

use super::parse_symbols;

pub fn run(args: &PortfolioArgs, engine: &Engine) -> Result<Value, CliError> {
    let tickers = parse_symbols(&args.tickers)?;
    let metrics = engine.get_portfolio_metrics(&tickers, args.weights.clone())?;
    if !metrics.skipped.is_empty() {
        tracing::warn!(skipped = ?metrics.skipped, "portfolio tickers not in universe");
    }
    Ok(serde_json::to_value(metrics)?)
}
