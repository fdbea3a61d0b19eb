use serde_json::Value;

use marketlens_engine::Engine;

use crate::error::CliError;

pub fn run(engine: &Engine) -> Result<Value, CliError> {
    Ok(serde_json::to_value(engine.get_sector_performance()?)?)
}
