use serde_json::Value;

use marketlens_analytics::DateRange;
use marketlens_engine::Engine;

use crate::cli::MasterArgs;
use crate::error::CliError;

use super::parse_symbols;

const NORMALIZED_BASE: f64 = 100.0;

pub fn run(args: &MasterArgs, engine: &Engine) -> Result<Value, CliError> {
    let tickers = parse_symbols(&args.tickers)?;
    let range = DateRange::new(args.from, args.to);

    let matrix = engine.get_master_matrix(range, &tickers)?;
    let matrix = if args.normalize {
        matrix.normalized(NORMALIZED_BASE)
    } else {
        matrix
    };
    Ok(serde_json::to_value(matrix)?)
}
