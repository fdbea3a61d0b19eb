//! Layered engine configuration.
//!
//! Sources, lowest precedence first:
//!
//! | Source | Example |
//! |--------|---------|
//! | Built-in defaults | 50 large caps, `2y`, 4 fetches in flight |
//! | `marketlens.toml` in the working directory, or `--config <path>` | `period = "5y"` |
//! | `MARKETLENS_*` environment variables | `MARKETLENS_TICKERS=AAPL,MSFT` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Environment, File};
use marketlens_core::{
    CollectorConfig, HistoryPeriod, SectorMap, Symbol, YahooConfig, STANDARD_TICKERS,
};
use marketlens_store::{resolve_marketlens_home, StoreConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base name of the optional configuration file; the extension is detected.
pub const DEFAULT_CONFIG_FILE: &str = "marketlens";

/// Prefix of environment overrides, e.g. `MARKETLENS_PERIOD`.
pub const ENV_PREFIX: &str = "MARKETLENS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Data directory; the snapshot lives at `<home>/snapshot.duckdb`.
    pub home: PathBuf,
    pub tickers: Vec<String>,
    pub period: HistoryPeriod,
    pub max_concurrency: usize,
    pub fetch_timeout_ms: u64,
    pub requests_per_minute: u32,
    /// Default level for `marketlens*` targets when `RUST_LOG` is unset.
    pub log_level: String,
    pub sectors: SectorMap,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            home: resolve_marketlens_home(),
            tickers: STANDARD_TICKERS.iter().map(|ticker| (*ticker).to_owned()).collect(),
            period: HistoryPeriod::default(),
            max_concurrency: 4,
            fetch_timeout_ms: 15_000,
            requests_per_minute: 60,
            log_level: String::from("info"),
            sectors: SectorMap::standard(),
        }
    }
}

impl EngineConfig {
    /// Loads defaults, then the config file, then `MARKETLENS_*` overrides.
    ///
    /// An explicit `path` must exist; the implicit `marketlens.toml` is optional.
    ///
    /// # Errors
    /// [`ConfigError::Load`] for unreadable or mistyped sources and
    /// [`ConfigError::Validation`] for out-of-range values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("tickers"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::Validation(
                "tickers must name at least one symbol".to_owned(),
            ));
        }
        self.symbols()?;
        if self.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "max_concurrency must be at least 1".to_owned(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "fetch_timeout_ms must be positive".to_owned(),
            ));
        }
        if self.requests_per_minute == 0 {
            return Err(ConfigError::Validation(
                "requests_per_minute must be positive".to_owned(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Validation("log_level must not be empty".to_owned()));
        }
        Ok(())
    }

    /// Configured tickers as validated symbols.
    pub fn symbols(&self) -> Result<Vec<Symbol>, ConfigError> {
        Symbol::parse_all(&self.tickers).map_err(|error| ConfigError::Validation(error.to_string()))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::in_home(&self.home)
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            max_concurrency: self.max_concurrency,
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
        }
    }

    pub fn yahoo_config(&self) -> YahooConfig {
        YahooConfig {
            timeout_ms: self.fetch_timeout_ms,
            requests_per_minute: self.requests_per_minute,
            ..YahooConfig::default()
        }
    }
}
