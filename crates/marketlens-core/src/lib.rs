//! Core contracts for marketlens.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The market data source contract and its adapters
//! - The per-ticker feature pipeline and shared statistics
//! - Sector classification and the concurrent collector

pub mod adapters;
pub mod circuit_breaker;
pub mod collector;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod features;
pub mod http_client;
pub mod retry;
pub mod sectors;
pub mod stats;
pub mod throttling;

pub use adapters::{SyntheticSource, YahooAdapter, YahooConfig};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use collector::{
    CollectionFailure, CollectionReport, Collector, CollectorConfig, FailureKind,
};
pub use data_source::{
    HistoryRequest, MarketDataSource, PriceHistory, SourceError, SourceErrorKind,
};
pub use domain::{
    ensure_strictly_increasing, Bar, EnrichedRow, EnrichedSeries, HistoryPeriod, ReferenceInfo,
    Symbol, TickerRecord, TradeDate, Universe, UniverseMeta, UtcDateTime, DEFAULT_SECTOR,
};
pub use error::ValidationError;
pub use features::{FeatureBuilder, FeatureError};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use retry::{Backoff, RetryPolicy};
pub use sectors::{SectorGroup, SectorMap, STANDARD_TICKERS};
pub use throttling::RequestThrottle;
