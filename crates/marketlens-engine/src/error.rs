use marketlens_analytics::AnalyticsError;
use marketlens_core::{Symbol, ValidationError};
use marketlens_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("universe is not loaded; call get_universe first")]
    NotLoaded,

    #[error("ticker '{0}' is not in the universe")]
    UnknownTicker(Symbol),

    #[error("collection produced no tickers out of {requested} requested")]
    NothingCollected { requested: usize },

    #[error("snapshot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
