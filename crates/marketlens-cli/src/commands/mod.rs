mod collect;
mod correlation;
mod master;
mod monthly;
mod portfolio;
mod risk;
mod scatter;
mod sectors;
mod summary;
mod universe;

use marketlens_core::Symbol;
use marketlens_engine::Engine;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Runs the selected command and returns its JSON payload.
///
/// Every command except `collect` first loads the universe, collecting it
/// when no snapshot exists.
pub async fn run(cli: &Cli, engine: &Engine) -> Result<Value, CliError> {
    if !matches!(cli.command, Command::Collect(_)) {
        engine.get_universe().await?;
    }

    match &cli.command {
        Command::Collect(args) => collect::run(args, engine).await,
        Command::Universe => universe::run(engine),
        Command::Risk(args) => risk::run(args, engine),
        Command::Portfolio(args) => portfolio::run(args, engine),
        Command::Correlation(args) => correlation::run(args, engine),
        Command::Sectors => sectors::run(engine),
        Command::Master(args) => master::run(args, engine),
        Command::Summary(args) => summary::run(args, engine),
        Command::Monthly(args) => monthly::run(args, engine),
        Command::Scatter(args) => scatter::run(args, engine),
    }
}

fn parse_symbol(raw: &str) -> Result<Symbol, CliError> {
    Ok(Symbol::parse(raw)?)
}

fn parse_symbols(raw: &[String]) -> Result<Vec<Symbol>, CliError> {
    Ok(Symbol::parse_all(raw)?)
}
