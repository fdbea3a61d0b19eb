use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EnrichedSeries, HistoryPeriod, Symbol, UtcDateTime, ValidationError};

/// Sector assigned to tickers absent from every sector mapping.
pub const DEFAULT_SECTOR: &str = "Other";

/// Provider reference data (name, market cap, industry, ...) carried verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceInfo(Map<String, Value>);

impl ReferenceInfo {
    pub const NAME: &'static str = "name";
    pub const MARKET_CAP: &'static str = "market_cap";
    pub const INDUSTRY: &'static str = "industry";
    pub const CURRENCY: &'static str = "currency";
    pub const EXCHANGE: &'static str = "exchange";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(ValidationError::ReferenceNotObject),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get(Self::NAME).and_then(Value::as_str)
    }

    pub fn market_cap(&self) -> Option<f64> {
        self.0
            .get(Self::MARKET_CAP)
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite() && *value > 0.0)
    }

    pub fn industry(&self) -> Option<&str> {
        self.0.get(Self::INDUSTRY).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything known about one ticker after a collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub symbol: Symbol,
    pub series: EnrichedSeries,
    pub sector: String,
    pub reference: ReferenceInfo,
}

/// Snapshot metadata stamped on every universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseMeta {
    pub period: HistoryPeriod,
    pub collected_at: UtcDateTime,
}

/// Immutable ticker to record mapping produced by one collection run.
///
/// Replaced wholesale on re-collection; there is no incremental update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    meta: UniverseMeta,
    records: BTreeMap<Symbol, TickerRecord>,
}

impl Universe {
    pub fn new(meta: UniverseMeta, records: Vec<TickerRecord>) -> Result<Self, ValidationError> {
        let mut by_symbol = BTreeMap::new();
        for record in records {
            let symbol = record.symbol.clone();
            if by_symbol.insert(symbol.clone(), record).is_some() {
                return Err(ValidationError::DuplicateSymbol {
                    symbol: symbol.to_string(),
                });
            }
        }
        Ok(Self {
            meta,
            records: by_symbol,
        })
    }

    pub fn empty(meta: UniverseMeta) -> Self {
        Self {
            meta,
            records: BTreeMap::new(),
        }
    }

    pub const fn meta(&self) -> UniverseMeta {
        self.meta
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&TickerRecord> {
        self.records.get(symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.records.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.records.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &TickerRecord> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
