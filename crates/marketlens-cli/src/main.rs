mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use std::process::ExitCode;

use marketlens_engine::{telemetry, Engine, EngineConfig};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(error = %error, "command failed");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref())?;
    telemetry::init_tracing(&config.log_level)?;

    let engine = Engine::from_config(&config, cli.offline)?;
    let data = commands::run(&cli, &engine).await?;
    output::render(&data, cli.pretty)?;

    Ok(ExitCode::SUCCESS)
}
