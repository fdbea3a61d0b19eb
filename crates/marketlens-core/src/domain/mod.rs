//! # Domain Models
//!
//! Canonical, validated types shared by every marketlens crate.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker |
//! | [`TradeDate`] | Session date (`YYYY-MM-DD`) |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`HistoryPeriod`] | Lookback window (`6mo`, `1y`, `2y`, ...) |
//! | [`Bar`] | Daily OHLCV bar |
//! | [`EnrichedRow`] / [`EnrichedSeries`] | Bars plus derived features |
//! | [`ReferenceInfo`] | Opaque provider reference data |
//! | [`TickerRecord`] / [`Universe`] | Collected dataset |
//!
//! Construction validates invariants, so a value of any of these types is
//! always well formed:
//!
//! ```rust,ignore
//! use marketlens_core::{Bar, TradeDate, ValidationError};
//!
//! let date = TradeDate::parse("2024-01-02")?;
//! let invalid = Bar::new(date, 100.0, 95.0, 105.0, 102.0, 1_000);
//! assert!(matches!(invalid, Err(ValidationError::InvalidBarRange)));
//! ```

mod date;
mod models;
mod period;
mod symbol;
mod universe;

pub use date::{TradeDate, UtcDateTime};
pub use models::{ensure_strictly_increasing, Bar, EnrichedRow, EnrichedSeries};
pub use period::HistoryPeriod;
pub use symbol::Symbol;
pub use universe::{ReferenceInfo, TickerRecord, Universe, UniverseMeta, DEFAULT_SECTOR};
