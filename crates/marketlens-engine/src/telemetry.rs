//! Process-wide `tracing` subscriber for binaries.
//!
//! Library code only emits events; installing a subscriber is left to the
//! binary so tests and embedders stay in control of output.

use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error(transparent)]
    Install(#[from] SetGlobalDefaultError),
}

/// Filter used when `RUST_LOG` is unset: `marketlens*` targets at `level`.
pub fn default_directive(level: &str) -> String {
    format!("marketlens={}", level.trim())
}

/// Builds the filter from `RUST_LOG`, falling back to [`default_directive`].
pub fn env_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_directive(level))?),
    }
}

/// Installs a formatting subscriber writing to stderr.
///
/// Stdout is reserved for command output.
pub fn init_tracing(level: &str) -> Result<(), TelemetryError> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(level)?)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
