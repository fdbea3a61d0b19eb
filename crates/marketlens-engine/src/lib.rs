//! Configured entry point to marketlens.
//!
//! [`Engine`] ties a market data source, the snapshot store and the analytics
//! crate together behind the read API consumers use. [`EngineConfig`] loads
//! layered configuration and [`telemetry`] installs logging for binaries.

pub mod config;
mod engine;
mod error;
pub mod telemetry;

pub use crate::config::{ConfigError, EngineConfig};
pub use engine::{Engine, Refresh};
pub use error::EngineError;
