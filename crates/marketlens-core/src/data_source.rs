//! Market data source contract.
//!
//! A [`MarketDataSource`] returns the daily price history and reference data
//! of one ticker. Failures are typed by [`SourceErrorKind`] so the collector
//! can match on them explicitly instead of swallowing arbitrary errors.
//!
//! ```rust,ignore
//! use marketlens_core::{HistoryPeriod, HistoryRequest, MarketDataSource, Symbol};
//!
//! async fn closes(source: &dyn MarketDataSource) -> Result<Vec<f64>, marketlens_core::SourceError> {
//!     let request = HistoryRequest::new(Symbol::parse("AAPL")?, HistoryPeriod::OneYear);
//!     let history = source.fetch(request).await?;
//!     Ok(history.bars.iter().map(|bar| bar.close).collect())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::{Bar, HistoryPeriod, ReferenceInfo, Symbol, ValidationError};

/// Source-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// The provider does not know the ticker.
    NotFound,
    /// Network, transport or provider-side failure.
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured source error returned by every adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn not_found(symbol: &Symbol) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: format!("no price history found for '{symbol}'"),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::internal(error.to_string())
    }
}

/// Request payload for a single-ticker history fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub period: HistoryPeriod,
}

impl HistoryRequest {
    pub const fn new(symbol: Symbol, period: HistoryPeriod) -> Self {
        Self { symbol, period }
    }
}

/// Raw daily bars plus reference data for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub symbol: Symbol,
    pub bars: Vec<Bar>,
    pub reference: ReferenceInfo,
}

/// Provider of historical daily bars.
///
/// Implementations must be `Send + Sync`; the collector shares one source
/// across concurrently running fetches.
pub trait MarketDataSource: Send + Sync {
    /// Short provider name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Fetches the daily history of `req.symbol` covering `req.period`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] with kind [`SourceErrorKind::NotFound`] for an
    /// unknown ticker and [`SourceErrorKind::Unavailable`] for network or
    /// provider failures.
    fn fetch<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>>;
}
