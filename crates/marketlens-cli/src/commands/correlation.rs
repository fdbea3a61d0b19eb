use serde_json::Value;

use marketlens_engine::Engine;

use crate::cli::TickersArgs;
use crate::error::CliError;

use super::parse_symbols;

pub fn run(args: &TickersArgs, engine: &Engine) -> Result<Value, CliError> {
    let tickers = parse_symbols(&args.tickers)?;
    Ok(serde_json::to_value(engine.get_correlation(&tickers)?)?)
}
