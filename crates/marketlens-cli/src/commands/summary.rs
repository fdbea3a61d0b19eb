use serde_json::Value;

use marketlens_engine::Engine;

use crate::cli::TickerArgs;
use crate::error::CliError;

use super::parse_symbol;

pub fn run(args: &TickerArgs, engine: &Engine) -> Result<Value, CliError> {
    let symbol = parse_symbol(&args.ticker)?;
    Ok(serde_json::to_value(engine.get_company_summary(&symbol)?)?)
}
