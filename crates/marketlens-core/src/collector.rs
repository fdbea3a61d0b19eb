//! Concurrent universe collection.
//!
//! Each ticker is fetched, enriched and classified independently. A ticker
//! that fails at any stage is dropped from the universe and recorded in the
//! [`CollectionReport`]; the run itself never aborts on a single ticker.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::data_source::{HistoryRequest, MarketDataSource, SourceError, SourceErrorKind};
use crate::features::FeatureBuilder;
use crate::sectors::SectorMap;
use crate::{HistoryPeriod, Symbol, TickerRecord, Universe, UniverseMeta, UtcDateTime};

/// Worker pool bounds for one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Fetches in flight at once. Zero is treated as one.
    pub max_concurrency: usize,
    /// Upper bound on a single ticker fetch, retries included.
    pub fetch_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            fetch_timeout: Duration::from_millis(15_000),
        }
    }
}

/// Stage at which a ticker was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FailureKind {
    /// The source returned an error or the fetch timed out (`Unavailable`).
    Fetch { kind: SourceErrorKind },
    /// The fetched bars could not be enriched.
    Enrichment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionFailure {
    pub symbol: Symbol,
    #[serde(flatten)]
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one collection run, alongside the universe it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub source: &'static str,
    pub period: HistoryPeriod,
    pub requested: usize,
    pub collected: Vec<Symbol>,
    pub failures: Vec<CollectionFailure>,
}

impl CollectionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds a [`Universe`] from a [`MarketDataSource`].
pub struct Collector {
    source: Arc<dyn MarketDataSource>,
    sectors: SectorMap,
    features: FeatureBuilder,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(source: Arc<dyn MarketDataSource>, sectors: SectorMap, config: CollectorConfig) -> Self {
        Self {
            source,
            sectors,
            features: FeatureBuilder::new(),
            config,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn sectors(&self) -> &SectorMap {
        &self.sectors
    }

    /// Collects every ticker it can; failed tickers are omitted.
    pub async fn collect(&self, tickers: &[Symbol], period: HistoryPeriod) -> Universe {
        self.collect_with_report(tickers, period).await.0
    }

    /// Like [`Collector::collect`], also reporting why tickers were dropped.
    ///
    /// Duplicate tickers in the request are fetched once.
    pub async fn collect_with_report(
        &self,
        tickers: &[Symbol],
        period: HistoryPeriod,
    ) -> (Universe, CollectionReport) {
        let requested: BTreeSet<Symbol> = tickers.iter().cloned().collect();
        tracing::info!(
            source = self.source.name(),
            tickers = requested.len(),
            period = %period,
            max_concurrency = self.config.max_concurrency,
            "starting collection"
        );

        let outcomes: Vec<Result<TickerRecord, CollectionFailure>> =
            stream::iter(requested.iter().cloned())
                .map(|symbol| self.collect_one(symbol, period))
                .buffer_unordered(self.config.max_concurrency.max(1))
                .collect()
                .await;

        let mut records = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(failure) => failures.push(failure),
            }
        }
        failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let meta = UniverseMeta {
            period,
            collected_at: UtcDateTime::now(),
        };
        // `requested` is a set, so records never repeat a symbol
        let universe = Universe::new(meta, records).unwrap_or_else(|error| {
            tracing::error!(error = %error, "discarding inconsistent collection");
            Universe::empty(meta)
        });

        let report = CollectionReport {
            source: self.source.name(),
            period,
            requested: requested.len(),
            collected: universe.symbols().cloned().collect(),
            failures,
        };
        tracing::info!(
            collected = report.collected.len(),
            failed = report.failures.len(),
            "collection finished"
        );
        (universe, report)
    }

    async fn collect_one(
        &self,
        symbol: Symbol,
        period: HistoryPeriod,
    ) -> Result<TickerRecord, CollectionFailure> {
        let request = HistoryRequest::new(symbol.clone(), period);
        let fetched = tokio::time::timeout(self.config.fetch_timeout, self.source.fetch(request))
            .await
            .unwrap_or_else(|_| {
                Err(SourceError::unavailable(format!(
                    "fetch timed out after {}ms",
                    self.config.fetch_timeout.as_millis()
                )))
            });

        let history = match fetched {
            Ok(history) => history,
            Err(error) => {
                tracing::warn!(
                    ticker = %symbol,
                    kind = error.code(),
                    error = %error,
                    "skipping ticker: fetch failed"
                );
                return Err(CollectionFailure {
                    symbol,
                    kind: FailureKind::Fetch { kind: error.kind() },
                    message: error.message().to_owned(),
                });
            }
        };

        let series = match self.features.build(&history.bars) {
            Ok(series) => series,
            Err(error) => {
                tracing::warn!(ticker = %symbol, error = %error, "skipping ticker: enrichment failed");
                return Err(CollectionFailure {
                    symbol,
                    kind: FailureKind::Enrichment,
                    message: error.to_string(),
                });
            }
        };

        tracing::debug!(ticker = %symbol, rows = series.len(), "ticker collected");
        let sector = self.sectors.classify(symbol.as_str()).to_owned();
        Ok(TickerRecord {
            symbol,
            series,
            sector,
            reference: history.reference,
        })
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("source", &self.source.name())
            .field("sectors", &self.sectors)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SectorGroup, SyntheticSource};

    fn symbols(values: &[&str]) -> Vec<Symbol> {
        Symbol::parse_all(values).expect("valid symbols")
    }

    fn collector(source: SyntheticSource, config: CollectorConfig) -> Collector {
        let sectors = SectorMap::new(vec![SectorGroup::new("Technology", ["AAPL", "MSFT"])]);
        Collector::new(Arc::new(source), sectors, config)
    }

    #[tokio::test]
    async fn assigns_sectors_and_reference_data() {
        let collector = collector(SyntheticSource::new(), CollectorConfig::default());
        let universe = collector
            .collect(&symbols(&["AAPL", "XOM"]), HistoryPeriod::SixMonths)
            .await;

        let aapl = universe.get(&symbols(&["AAPL"])[0]).expect("collected");
        let xom = universe.get(&symbols(&["XOM"])[0]).expect("collected");
        assert_eq!(aapl.sector, "Technology");
        assert_eq!(xom.sector, crate::DEFAULT_SECTOR);
        assert!(aapl.reference.name().is_some());
        assert_eq!(aapl.series.len(), HistoryPeriod::SixMonths.trading_days());
        assert_eq!(universe.meta().period, HistoryPeriod::SixMonths);
    }

    #[tokio::test]
    async fn duplicate_requests_are_fetched_once() {
        let collector = collector(SyntheticSource::new(), CollectorConfig::default());
        let (universe, report) = collector
            .collect_with_report(&symbols(&["AAPL", "aapl", "MSFT"]), HistoryPeriod::SixMonths)
            .await;

        assert_eq!(universe.len(), 2);
        assert_eq!(report.requested, 2);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn slow_fetch_times_out_as_unavailable() {
        let slow = symbols(&["SLOW"]).remove(0);
        let source = SyntheticSource::new().with_latency(slow.clone(), Duration::from_secs(5));
        let collector = collector(
            source,
            CollectorConfig {
                max_concurrency: 2,
                fetch_timeout: Duration::from_millis(50),
            },
        );

        let (universe, report) = collector
            .collect_with_report(&symbols(&["AAPL", "SLOW"]), HistoryPeriod::SixMonths)
            .await;

        assert_eq!(universe.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, slow);
        assert_eq!(
            report.failures[0].kind,
            FailureKind::Fetch {
                kind: SourceErrorKind::Unavailable
            }
        );
        assert!(report.failures[0].message.contains("timed out"));
    }

    #[tokio::test]
    async fn zero_concurrency_still_collects() {
        let collector = collector(
            SyntheticSource::new(),
            CollectorConfig {
                max_concurrency: 0,
                ..CollectorConfig::default()
            },
        );
        let universe = collector
            .collect(&symbols(&["AAPL"]), HistoryPeriod::SixMonths)
            .await;
        assert_eq!(universe.len(), 1);
    }

    #[test]
    fn failure_serializes_with_stage_tag() {
        let failure = CollectionFailure {
            symbol: symbols(&["ZZZZ"]).remove(0),
            kind: FailureKind::Fetch {
                kind: SourceErrorKind::NotFound,
            },
            message: String::from("no price history found for 'ZZZZ'"),
        };
        let value = serde_json::to_value(&failure).expect("serialize");
        assert_eq!(value["stage"], "fetch");
        assert_eq!(value["kind"], "not_found");
        assert_eq!(value["symbol"], "ZZZZ");
    }
}
