use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::data_source::{HistoryRequest, MarketDataSource, PriceHistory, SourceError};
use crate::{Bar, HistoryPeriod, ReferenceInfo, Symbol, TradeDate};

const PROVIDER: &str = "synthetic";

/// Offline source producing a deterministic random walk per ticker.
///
/// The same symbol, start date and period always yield the same bars, so
/// the full pipeline can run without network access. Individual tickers can
/// be configured to fail or to respond slowly.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    start: TradeDate,
    missing: BTreeSet<Symbol>,
    failing: BTreeSet<Symbol>,
    latency: BTreeMap<Symbol, Duration>,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::starting_at(TradeDate::from_date(time::macros::date!(2022 - 01 - 03)))
    }
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start: TradeDate) -> Self {
        Self {
            start,
            missing: BTreeSet::new(),
            failing: BTreeSet::new(),
            latency: BTreeMap::new(),
        }
    }

    /// Symbols answered with `NotFound`.
    pub fn with_missing(mut self, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        self.missing.extend(symbols);
        self
    }

    /// Symbols answered with a retryable `Unavailable` error.
    pub fn with_failing(mut self, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        self.failing.extend(symbols);
        self
    }

    pub fn with_latency(mut self, symbol: Symbol, delay: Duration) -> Self {
        self.latency.insert(symbol, delay);
        self
    }

    /// Generates the history without any configured failure or latency.
    pub fn history(
        &self,
        symbol: &Symbol,
        period: HistoryPeriod,
    ) -> Result<PriceHistory, SourceError> {
        let seed = symbol_seed(symbol);
        let mut rng = fastrand::Rng::with_seed(seed);

        let drift = 0.0002 + (seed % 7) as f64 * 0.000_1;
        let volatility = 0.008 + (seed % 11) as f64 * 0.001;
        let mut close = 40.0 + (seed % 400) as f64;
        let mut date = self.start;

        let sessions = period.trading_days();
        let mut bars = Vec::with_capacity(sessions);
        for _ in 0..sessions {
            let open = close;
            // uniform shock scaled to unit variance
            let shock = (rng.f64() * 2.0 - 1.0) * 3.0_f64.sqrt();
            close = open * (1.0 + drift + volatility * shock);
            let high = open.max(close) * (1.0 + rng.f64() * 0.01);
            let low = open.min(close) * (1.0 - rng.f64() * 0.01);
            let volume = 1_000_000 + rng.u64(0..5_000_000);

            bars.push(Bar::new(date, open, high, low, close, volume)?);
            date = date.next_weekday();
        }

        let reference = ReferenceInfo::new()
            .with(ReferenceInfo::NAME, format!("{symbol} Holdings"))
            .with(ReferenceInfo::MARKET_CAP, (10 + seed % 2_000) as f64 * 1.0e9)
            .with(ReferenceInfo::CURRENCY, "USD")
            .with(ReferenceInfo::EXCHANGE, "SYN");

        Ok(PriceHistory {
            symbol: symbol.clone(),
            bars,
            reference,
        })
    }
}

impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn fetch<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(delay) = self.latency.get(&req.symbol) {
                tokio::time::sleep(*delay).await;
            }
            if self.missing.contains(&req.symbol) {
                return Err(SourceError::not_found(&req.symbol));
            }
            if self.failing.contains(&req.symbol) {
                return Err(SourceError::unavailable(format!(
                    "synthetic outage for '{}'",
                    req.symbol
                )));
            }
            self.history(&req.symbol, req.period)
        })
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(5_381_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceErrorKind;

    fn symbol(value: &str) -> Symbol {
        Symbol::parse(value).expect("valid symbol")
    }

    #[test]
    fn history_is_deterministic_per_symbol() {
        let source = SyntheticSource::new();
        let first = source
            .history(&symbol("AAPL"), HistoryPeriod::SixMonths)
            .expect("history");
        let second = source
            .history(&symbol("AAPL"), HistoryPeriod::SixMonths)
            .expect("history");
        let other = source
            .history(&symbol("MSFT"), HistoryPeriod::SixMonths)
            .expect("history");

        assert_eq!(first, second);
        assert_ne!(first.bars, other.bars);
    }

    #[test]
    fn history_covers_period_on_weekdays() {
        let history = SyntheticSource::new()
            .history(&symbol("XOM"), HistoryPeriod::OneYear)
            .expect("history");

        assert_eq!(history.bars.len(), HistoryPeriod::OneYear.trading_days());
        assert!(history.bars.windows(2).all(|pair| pair[0].date < pair[1].date));
        assert!(history
            .bars
            .iter()
            .all(|bar| !matches!(bar.date.into_inner().weekday(), time::Weekday::Saturday | time::Weekday::Sunday)));
        assert!(history.reference.market_cap().is_some());
    }

    #[tokio::test]
    async fn configured_tickers_fail_with_their_kind() {
        let source = SyntheticSource::new()
            .with_missing([symbol("GONE")])
            .with_failing([symbol("FLAKY")]);

        let missing = source
            .fetch(HistoryRequest::new(symbol("GONE"), HistoryPeriod::SixMonths))
            .await
            .expect_err("missing ticker");
        let failing = source
            .fetch(HistoryRequest::new(symbol("FLAKY"), HistoryPeriod::SixMonths))
            .await
            .expect_err("failing ticker");

        assert_eq!(missing.kind(), SourceErrorKind::NotFound);
        assert_eq!(failing.kind(), SourceErrorKind::Unavailable);
    }
}
