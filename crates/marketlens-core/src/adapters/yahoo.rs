use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::data_source::{HistoryRequest, MarketDataSource, PriceHistory, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::retry::RetryPolicy;
use crate::throttling::RequestThrottle;
use crate::{Bar, ReferenceInfo, Symbol, TradeDate};

const PROVIDER: &str = "yahoo";
const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const REFERER: &str = "https://finance.yahoo.com/";

/// Transport and resilience settings of the Yahoo adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct YahooConfig {
    /// Scheme and host of the chart API, without a trailing slash.
    pub base_url: String,
    pub timeout_ms: u64,
    pub requests_per_minute: u32,
    pub retry: RetryPolicy,
    pub circuit: CircuitBreakerConfig,
    /// Also query the quoteSummary endpoint for market cap and industry.
    pub include_profile: bool,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: 15_000,
            requests_per_minute: 60,
            retry: RetryPolicy::default(),
            circuit: CircuitBreakerConfig::default(),
            include_profile: true,
        }
    }
}

/// Daily history from the Yahoo Finance v8 chart endpoint.
///
/// Every chart fetch passes through a shared request throttle, a circuit
/// breaker and a bounded retry loop. Only transient failures (transport
/// errors, 429 and 5xx responses) are retried; an unknown ticker fails fast
/// with `NotFound`.
///
/// Reference data is enriched best-effort from the quoteSummary endpoint. A
/// failed profile lookup never fails the fetch; the chart metadata alone is
/// kept.
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    config: YahooConfig,
    throttle: RequestThrottle,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl YahooAdapter {
    pub fn new(config: YahooConfig) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), config)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, config: YahooConfig) -> Self {
        Self {
            http_client,
            throttle: RequestThrottle::per_minute(config.requests_per_minute),
            circuit_breaker: Arc::new(CircuitBreaker::new(config.circuit)),
            config,
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    fn chart_url(&self, req: &HistoryRequest) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(req.symbol.as_str()),
            req.period.as_str()
        )
    }

    fn profile_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/v10/finance/quoteSummary/{}?modules=price,assetProfile",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(symbol.as_str())
        )
    }

    async fn fetch_profile(&self, symbol: &Symbol) -> Option<ProfileResult> {
        self.throttle.acquire().await;
        let request = HttpRequest::get(self.profile_url(symbol))
            .with_header("referer", REFERER)
            .with_timeout_ms(self.config.timeout_ms);

        let response = match self.http_client.execute(request).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::debug!(ticker = %symbol, status = response.status, "yahoo profile unavailable");
                return None;
            }
            Err(error) => {
                tracing::debug!(ticker = %symbol, error = %error, "yahoo profile request failed");
                return None;
            }
        };

        match serde_json::from_str::<ProfileEnvelope>(&response.body) {
            Ok(envelope) => envelope.quote_summary.result.into_iter().flatten().next(),
            Err(error) => {
                tracing::debug!(ticker = %symbol, error = %error, "yahoo profile did not parse");
                None
            }
        }
    }

    async fn fetch_once(&self, req: &HistoryRequest) -> Result<PriceHistory, SourceError> {
        self.circuit_breaker.check(PROVIDER)?;
        self.throttle.acquire().await;

        let request = HttpRequest::get(self.chart_url(req))
            .with_header("referer", REFERER)
            .with_timeout_ms(self.config.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.record_failure();
            if error.retryable() {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            } else {
                SourceError::internal(format!("yahoo request error: {}", error.message()))
            }
        })?;

        match response.status {
            404 => {
                // the provider answered; an unknown ticker says nothing about its health
                self.circuit_breaker.record_success();
                return Err(SourceError::not_found(&req.symbol));
            }
            429 => {
                self.circuit_breaker.record_failure();
                return Err(SourceError::rate_limited(
                    "yahoo rate limit exceeded (429)",
                ));
            }
            status if !response.is_success() => {
                self.circuit_breaker.record_failure();
                return Err(SourceError::unavailable(format!(
                    "yahoo chart endpoint returned status {status}"
                )));
            }
            _ => self.circuit_breaker.record_success(),
        }

        parse_chart(&req.symbol, &response.body)
    }
}

impl MarketDataSource for YahooAdapter {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn fetch<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let label = format!("{PROVIDER}:{}", req.symbol);
            let mut history = self
                .config
                .retry
                .run(&label, || self.fetch_once(&req))
                .await?;

            if self.config.include_profile {
                if let Some(profile) = self.fetch_profile(&req.symbol).await {
                    history.reference = profile.merge_into(history.reference);
                }
            }
            Ok(history)
        })
    }
}

impl std::fmt::Debug for YahooAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooAdapter")
            .field("config", &self.config)
            .field("throttle", &self.throttle)
            .field("circuit_state", &self.circuit_breaker.state())
            .finish()
    }
}

fn parse_chart(symbol: &Symbol, body: &str) -> Result<PriceHistory, SourceError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = envelope.chart.error {
        if error.code.eq_ignore_ascii_case("not found") {
            return Err(SourceError::not_found(symbol));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {} {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(result) = envelope.chart.result.into_iter().flatten().next() else {
        return Err(SourceError::not_found(symbol));
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Err(SourceError::not_found(symbol));
    };

    let mut bars: Vec<Bar> = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Ok(date) = TradeDate::from_unix_timestamp(ts) else {
            continue;
        };
        // rows with any missing price are provider gaps, not zero prices
        let (Some(open), Some(high), Some(low), Some(close)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        ) else {
            continue;
        };
        let volume = value_at(&quote.volume, i).unwrap_or(0);
        let bar = match Bar::new(date, open, high, low, close, volume) {
            Ok(bar) => bar,
            Err(error) => {
                tracing::debug!(ticker = %symbol, date = %date, error = %error, "yahoo bar dropped");
                continue;
            }
        };

        match bars.last().map(|last| last.date) {
            // an in-progress session can repeat the last date; keep the newest
            Some(previous) if previous == date => {
                let index = bars.len() - 1;
                bars[index] = bar;
            }
            Some(previous) if previous > date => continue,
            _ => bars.push(bar),
        }
    }

    if bars.is_empty() {
        return Err(SourceError::not_found(symbol));
    }

    Ok(PriceHistory {
        symbol: symbol.clone(),
        bars,
        reference: result.meta.into_reference(),
    })
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    exchange_name: Option<String>,
    #[serde(default)]
    instrument_type: Option<String>,
}

impl ChartMeta {
    fn into_reference(self) -> ReferenceInfo {
        let mut reference = ReferenceInfo::new();
        if let Some(name) = self.long_name.or(self.short_name) {
            reference = reference.with(ReferenceInfo::NAME, name);
        }
        if let Some(currency) = self.currency {
            reference = reference.with(ReferenceInfo::CURRENCY, currency);
        }
        if let Some(exchange) = self.exchange_name {
            reference = reference.with(ReferenceInfo::EXCHANGE, exchange);
        }
        if let Some(instrument_type) = self.instrument_type {
            reference = reference.with("instrument_type", instrument_type);
        }
        reference
    }
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: ProfileBody,
}

#[derive(Debug, Deserialize)]
struct ProfileBody {
    #[serde(default)]
    result: Option<Vec<ProfileResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResult {
    #[serde(default)]
    price: Option<ProfilePrice>,
    #[serde(default)]
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePrice {
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

impl ProfileResult {
    fn merge_into(self, mut reference: ReferenceInfo) -> ReferenceInfo {
        if let Some(price) = self.price {
            if let Some(name) = price.long_name {
                reference = reference.with(ReferenceInfo::NAME, name);
            }
            if let Some(market_cap) = price.market_cap.and_then(|value| value.raw) {
                reference = reference.with(ReferenceInfo::MARKET_CAP, market_cap);
            }
        }
        if let Some(profile) = self.asset_profile {
            if let Some(industry) = profile.industry {
                reference = reference.with(ReferenceInfo::INDUSTRY, industry);
            }
            if let Some(sector) = profile.sector {
                reference = reference.with("provider_sector", sector);
            }
        }
        reference
    }
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::HistoryPeriod;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "exchangeName": "NMS", "longName": "Apple Inc.", "instrumentType": "EQUITY"},
                "timestamp": [1704205800, 1704292200, 1704378600, 1704378600, 1704465000],
                "indicators": {"quote": [{
                    "open":   [187.15, 184.22, 182.15, 181.99, null],
                    "high":   [188.44, 185.88, 183.09, 183.09, 182.76],
                    "low":    [183.89, 183.43, 180.88, 180.88, 180.17],
                    "close":  [185.64, 184.25, 181.50, 181.91, 181.18],
                    "volume": [82488700, 58414500, 71983600, 71983600, null]
                }]}
            }],
            "error": null
        }
    }"#;

    #[derive(Debug)]
    struct CannedHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl CannedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for CannedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self
                .responses
                .lock()
                .expect("response queue should not be poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new("no canned response left")));
            Box::pin(async move { response })
        }
    }

    fn adapter(client: Arc<CannedHttpClient>) -> YahooAdapter {
        YahooAdapter::with_http_client(
            client,
            YahooConfig {
                base_url: String::from("https://chart.example.test"),
                requests_per_minute: 600,
                retry: RetryPolicy::fixed(Duration::from_millis(1), 2),
                include_profile: false,
                ..YahooConfig::default()
            },
        )
    }

    fn request(symbol: &str) -> HistoryRequest {
        HistoryRequest::new(Symbol::parse(symbol).expect("valid symbol"), HistoryPeriod::OneYear)
    }

    #[tokio::test]
    async fn parses_chart_into_bars_and_reference() {
        let client = Arc::new(CannedHttpClient::new(vec![Ok(HttpResponse::ok_json(CHART_BODY))]));
        let history = adapter(client.clone())
            .fetch(request("AAPL"))
            .await
            .expect("chart parses");

        let dates: Vec<String> = history.bars.iter().map(|bar| bar.date.to_string()).collect();
        // the repeated 01-04 row replaces the first one; the null open drops 01-05
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(history.bars[2].open, 181.99);
        assert_eq!(history.bars[2].close, 181.91);
        assert_eq!(history.reference.name(), Some("Apple Inc."));
        assert_eq!(
            history.reference.get(ReferenceInfo::EXCHANGE).and_then(|v| v.as_str()),
            Some("NMS")
        );

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://chart.example.test/v8/finance/chart/AAPL?range=1y&interval=1d"
        );
        assert_eq!(
            requests[0].headers.get("referer").map(String::as_str),
            Some(REFERER)
        );
    }

    #[tokio::test]
    async fn profile_enriches_reference_data() {
        let profile = r#"{"quoteSummary":{"result":[{
            "price": {"longName": "Apple Inc.", "marketCap": {"raw": 2950000000000.0, "fmt": "2.95T"}},
            "assetProfile": {"sector": "Technology", "industry": "Consumer Electronics"}
        }],"error":null}}"#;
        let client = Arc::new(CannedHttpClient::new(vec![
            Ok(HttpResponse::ok_json(CHART_BODY)),
            Ok(HttpResponse::ok_json(profile)),
        ]));
        let adapter = YahooAdapter::with_http_client(
            client.clone(),
            YahooConfig {
                base_url: String::from("https://chart.example.test"),
                requests_per_minute: 600,
                ..YahooConfig::default()
            },
        );

        let history = adapter.fetch(request("AAPL")).await.expect("chart parses");

        assert_eq!(history.reference.market_cap(), Some(2.95e12));
        assert_eq!(history.reference.industry(), Some("Consumer Electronics"));
        assert!(client.recorded_requests()[1]
            .url
            .ends_with("/v10/finance/quoteSummary/AAPL?modules=price,assetProfile"));
    }

    #[tokio::test]
    async fn failed_profile_keeps_chart_reference() {
        let client = Arc::new(CannedHttpClient::new(vec![
            Ok(HttpResponse::ok_json(CHART_BODY)),
            Ok(HttpResponse::with_status(401, r#"{"finance":{"error":"Unauthorized"}}"#)),
        ]));
        let adapter = YahooAdapter::with_http_client(
            client,
            YahooConfig {
                base_url: String::from("https://chart.example.test"),
                requests_per_minute: 600,
                ..YahooConfig::default()
            },
        );

        let history = adapter.fetch(request("AAPL")).await.expect("profile is optional");

        assert_eq!(history.reference.name(), Some("Apple Inc."));
        assert_eq!(history.reference.market_cap(), None);
    }

    #[tokio::test]
    async fn unknown_ticker_is_not_found_without_retry() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let client = Arc::new(CannedHttpClient::new(vec![Ok(HttpResponse::with_status(404, body))]));
        let error = adapter(client.clone())
            .fetch(request("ZZZZ"))
            .await
            .expect_err("unknown ticker");

        assert_eq!(error.kind(), SourceErrorKind::NotFound);
        assert_eq!(client.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn chart_level_not_found_error_is_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"delisted"}}}"#;
        let client = Arc::new(CannedHttpClient::new(vec![Ok(HttpResponse::ok_json(body))]));
        let error = adapter(client)
            .fetch(request("ZZZZ"))
            .await
            .expect_err("unknown ticker");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let client = Arc::new(CannedHttpClient::new(vec![
            Ok(HttpResponse::with_status(503, "")),
            Err(HttpError::new("connection reset")),
            Ok(HttpResponse::ok_json(CHART_BODY)),
        ]));
        let history = adapter(client.clone())
            .fetch(request("AAPL"))
            .await
            .expect("third attempt succeeds");

        assert_eq!(history.bars.len(), 3);
        assert_eq!(client.recorded_requests().len(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_unavailable() {
        let client = Arc::new(CannedHttpClient::new(vec![
            Ok(HttpResponse::with_status(500, "")),
            Ok(HttpResponse::with_status(502, "")),
            Ok(HttpResponse::with_status(503, "")),
        ]));
        let error = adapter(client)
            .fetch(request("AAPL"))
            .await
            .expect_err("all attempts fail");

        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("503"));
    }

    #[tokio::test]
    async fn empty_chart_is_not_found() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let client = Arc::new(CannedHttpClient::new(vec![Ok(HttpResponse::ok_json(body))]));
        let error = adapter(client)
            .fetch(request("NEWCO"))
            .await
            .expect_err("no bars");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
    }

    #[tokio::test]
    async fn malformed_body_is_internal() {
        let client = Arc::new(CannedHttpClient::new(vec![Ok(HttpResponse::ok_json("<html>"))]));
        let error = adapter(client)
            .fetch(request("AAPL"))
            .await
            .expect_err("not json");
        assert_eq!(error.kind(), SourceErrorKind::Internal);
        assert!(!error.retryable());
    }

    #[test]
    fn bars_violating_price_bounds_are_dropped() {
        let body = r#"{"chart":{"result":[{
            "meta": {},
            "timestamp": [1704205800, 1704292200],
            "indicators": {"quote": [{
                "open":   [187.15, 184.22],
                "high":   [180.00, 185.88],
                "low":    [183.89, 183.43],
                "close":  [185.64, 184.25],
                "volume": [82488700, 58414500]
            }]}
        }],"error":null}}"#;
        let symbol = Symbol::parse("AAPL").expect("valid symbol");

        let history = parse_chart(&symbol, body).expect("one valid bar");

        assert_eq!(history.bars.len(), 1);
        assert_eq!(history.bars[0].date.to_string(), "2024-01-03");
    }
}
