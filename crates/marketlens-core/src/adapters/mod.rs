//! [`MarketDataSource`](crate::MarketDataSource) implementations.
//!
//! | Adapter | Backing |
//! |---------|---------|
//! | [`YahooAdapter`] | Yahoo Finance chart API over HTTP |
//! | [`SyntheticSource`] | Deterministic random walk, no network |

mod synthetic;
mod yahoo;

pub use synthetic::SyntheticSource;
pub use yahoo::{YahooAdapter, YahooConfig};
