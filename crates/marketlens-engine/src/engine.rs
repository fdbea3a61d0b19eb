//! Consumer-facing read API.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use marketlens_analytics::{
    company_summary, monthly_returns, risk_return_points, CompanySummary, CorrelationAnalyzer,
    CorrelationMatrix, DateRange, MasterMatrix, MonthlyReturn, PortfolioAnalyzer,
    PortfolioMetrics, PortfolioSpec, RiskAnalyzer, RiskMetrics, RiskReturnReport,
    SectorAggregator, SectorPerformance,
};
use marketlens_core::{
    CollectionReport, Collector, HistoryPeriod, MarketDataSource, SectorMap, Symbol,
    SyntheticSource, TickerRecord, Universe, YahooAdapter,
};
use marketlens_store::{SnapshotStore, StoreError};

use crate::{EngineConfig, EngineError};

/// Result of a forced re-collection.
#[derive(Debug, Clone)]
pub struct Refresh {
    pub universe: Arc<Universe>,
    pub report: CollectionReport,
}

/// Collection, persistence and analytics behind one handle.
///
/// The universe is loaded (or collected) once by [`Engine::get_universe`]
/// and cached; the synchronous getters read that cached value and fail with
/// [`EngineError::NotLoaded`] until then.
pub struct Engine {
    collector: Collector,
    store: SnapshotStore,
    tickers: Vec<Symbol>,
    period: HistoryPeriod,
    sectors: SectorMap,
    universe: RwLock<Option<Arc<Universe>>>,
}

impl Engine {
    /// Engine backed by Yahoo Finance, or by [`SyntheticSource`] when `offline`.
    pub fn from_config(config: &EngineConfig, offline: bool) -> Result<Self, EngineError> {
        let source: Arc<dyn MarketDataSource> = if offline {
            Arc::new(SyntheticSource::new())
        } else {
            Arc::new(YahooAdapter::new(config.yahoo_config()))
        };
        Self::with_source(source, config)
    }

    pub fn with_source(
        source: Arc<dyn MarketDataSource>,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            collector: Collector::new(source, config.sectors.clone(), config.collector_config()),
            store: SnapshotStore::new(config.store_config()),
            tickers: config.symbols()?,
            period: config.period,
            sectors: config.sectors.clone(),
            universe: RwLock::new(None),
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn source_name(&self) -> &'static str {
        self.collector.source_name()
    }

    pub fn configured_tickers(&self) -> &[Symbol] {
        &self.tickers
    }

    pub const fn configured_period(&self) -> HistoryPeriod {
        self.period
    }

    /// Cached universe, loading the snapshot or collecting on first use.
    ///
    /// A missing snapshot triggers a collection with the configured tickers
    /// and period, which is then saved. A corrupt snapshot is an error and
    /// is never silently replaced.
    pub async fn get_universe(&self) -> Result<Arc<Universe>, EngineError> {
        if let Some(universe) = self.cached() {
            return Ok(universe);
        }

        let store = self.store.clone();
        let loaded = tokio::task::spawn_blocking(move || store.load()).await?;
        let universe = match loaded {
            Ok(universe) => {
                tracing::info!(
                    path = %self.store.path().display(),
                    tickers = universe.len(),
                    "loaded snapshot"
                );
                universe
            }
            Err(StoreError::NotFound { path }) => {
                tracing::info!(path = %path.display(), "no snapshot found; collecting");
                self.collect_and_save(&self.tickers, self.period).await?.0
            }
            Err(error) => return Err(error.into()),
        };

        Ok(self.install(universe))
    }

    /// Re-collects the configured universe and replaces the snapshot.
    pub async fn refresh(&self) -> Result<Refresh, EngineError> {
        self.recollect(&self.tickers, self.period).await
    }

    /// Re-collects `tickers` over `period` and replaces the snapshot.
    ///
    /// # Errors
    /// [`EngineError::NothingCollected`] when every ticker failed; the
    /// previous snapshot and cached universe are kept.
    pub async fn recollect(
        &self,
        tickers: &[Symbol],
        period: HistoryPeriod,
    ) -> Result<Refresh, EngineError> {
        let (universe, report) = self.collect_and_save(tickers, period).await?;
        Ok(Refresh {
            universe: self.install(universe),
            report,
        })
    }

    async fn collect_and_save(
        &self,
        tickers: &[Symbol],
        period: HistoryPeriod,
    ) -> Result<(Universe, CollectionReport), EngineError> {
        let (universe, report) = self.collector.collect_with_report(tickers, period).await;
        if universe.is_empty() {
            return Err(EngineError::NothingCollected {
                requested: report.requested,
            });
        }

        let store = self.store.clone();
        let (universe, saved) = tokio::task::spawn_blocking(move || {
            let saved = store.save(&universe);
            (universe, saved)
        })
        .await?;
        saved?;
        Ok((universe, report))
    }

    fn cached(&self) -> Option<Arc<Universe>> {
        self.universe
            .read()
            .expect("engine universe lock poisoned")
            .clone()
    }

    fn install(&self, universe: Universe) -> Arc<Universe> {
        let universe = Arc::new(universe);
        *self
            .universe
            .write()
            .expect("engine universe lock poisoned") = Some(Arc::clone(&universe));
        universe
    }

    /// The cached universe without loading it.
    pub fn universe(&self) -> Result<Arc<Universe>, EngineError> {
        self.cached().ok_or(EngineError::NotLoaded)
    }

    fn with_record<T>(
        &self,
        ticker: &Symbol,
        f: impl FnOnce(&TickerRecord) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let universe = self.universe()?;
        let record = universe
            .get(ticker)
            .ok_or_else(|| EngineError::UnknownTicker(ticker.clone()))?;
        f(record)
    }

    /// Close prices over `range`; all tickers when `tickers` is empty.
    pub fn get_master_matrix(
        &self,
        range: DateRange,
        tickers: &[Symbol],
    ) -> Result<MasterMatrix, EngineError> {
        let universe = self.universe()?;
        if let Some(unknown) = tickers.iter().find(|ticker| !universe.contains(ticker)) {
            return Err(EngineError::UnknownTicker(unknown.clone()));
        }
        let selection = (!tickers.is_empty()).then_some(tickers);
        Ok(MasterMatrix::build(&universe).slice(range, selection))
    }

    pub fn get_risk_metrics(&self, ticker: &Symbol) -> Result<RiskMetrics, EngineError> {
        self.with_record(ticker, |record| {
            Ok(RiskAnalyzer::new().analyze_series(&record.series)?)
        })
    }

    pub fn get_portfolio_metrics(
        &self,
        tickers: &[Symbol],
        weights: Option<Vec<f64>>,
    ) -> Result<PortfolioMetrics, EngineError> {
        let universe = self.universe()?;
        let spec = PortfolioSpec {
            tickers: tickers.to_vec(),
            weights,
        };
        Ok(PortfolioAnalyzer::new().analyze(&universe, &spec)?)
    }

    /// Pairwise return correlation; all tickers when `tickers` is empty.
    pub fn get_correlation(&self, tickers: &[Symbol]) -> Result<CorrelationMatrix, EngineError> {
        let universe = self.universe()?;
        let tickers: Vec<Symbol> = if tickers.is_empty() {
            universe.symbols().cloned().collect()
        } else {
            tickers.to_vec()
        };
        Ok(CorrelationAnalyzer::new().correlation(&universe, &tickers)?)
    }

    pub fn get_sector_performance(&self) -> Result<BTreeMap<String, SectorPerformance>, EngineError> {
        let universe = self.universe()?;
        Ok(SectorAggregator::with_map(self.sectors.clone()).aggregate(&universe))
    }

    pub fn get_company_summary(&self, ticker: &Symbol) -> Result<CompanySummary, EngineError> {
        self.with_record(ticker, |record| Ok(company_summary(record)?))
    }

    pub fn get_monthly_returns(&self, ticker: &Symbol) -> Result<Vec<MonthlyReturn>, EngineError> {
        self.with_record(ticker, |record| Ok(monthly_returns(record)))
    }

    /// Annual return against volatility; all tickers when `tickers` is empty.
    pub fn get_risk_return_points(&self, tickers: &[Symbol]) -> Result<RiskReturnReport, EngineError> {
        let universe = self.universe()?;
        Ok(risk_return_points(&universe, tickers))
    }
}
