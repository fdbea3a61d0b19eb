use marketlens_analytics::AnalyticsError;
use marketlens_engine::telemetry::TelemetryError;
use marketlens_engine::{ConfigError, EngineError};
use marketlens_store::StoreError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] marketlens_core::ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// `2` bad input, `3` not enough data, `4` output encoding,
    /// `6` unreadable snapshot, `10` anything else.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_)
            | Self::Config(_)
            | Self::Engine(EngineError::Config(_))
            | Self::Engine(EngineError::Validation(_))
            | Self::Engine(EngineError::UnknownTicker(_))
            | Self::Engine(EngineError::Analytics(AnalyticsError::InvalidInput(_)))
            | Self::Engine(EngineError::Analytics(AnalyticsError::UnknownTicker(_))) => 2,
            Self::Engine(EngineError::Analytics(AnalyticsError::InsufficientData { .. }))
            | Self::Engine(EngineError::NothingCollected { .. }) => 3,
            Self::Serialization(_) => 4,
            Self::Engine(EngineError::Store(StoreError::CorruptData(_))) => 6,
            Self::Engine(_) | Self::Telemetry(_) | Self::Io(_) => 10,
        }
    }
}
