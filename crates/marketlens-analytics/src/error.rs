use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("insufficient data: need at least {required} observations, found {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("ticker '{0}' is not in the universe")]
    UnknownTicker(String),
}
