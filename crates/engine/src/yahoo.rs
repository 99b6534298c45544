use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use common::{Error, MarketDataSource, PriceBar, PriceSeries, Result, Timeframe};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart API. Serves equities (`TCS.NS`) and crypto (`SOL-USD`).
pub struct YahooClient {
    http: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; sigbot)")
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point at a different host, e.g. a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Chart URL with `symbol` appended as a single encoded path segment.
    pub fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid chart base URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("chart base URL '{}' cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push(symbol);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch(&self, symbol: &str, timeframe: Timeframe, lookback: &str) -> Result<PriceSeries> {
        let fetch_err = |reason: String| Error::DataFetch {
            symbol: symbol.to_string(),
            reason,
        };
        let url = self.chart_url(symbol).map_err(|e| fetch_err(e.to_string()))?;

        debug!(symbol, %timeframe, lookback, "Fetching chart");
        let resp = self
            .http
            .get(url)
            .query(&[("interval", timeframe.as_str()), ("range", lookback)])
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| fetch_err(e.to_string()))?;
        // Yahoo reports unknown symbols as 404 with a chart.error body.
        if !status.is_success() && !body.contains("\"chart\"") {
            return Err(fetch_err(format!("HTTP {status}")));
        }
        parse_chart(symbol, timeframe, &body)
    }
}

// ─── Response parsing ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Turn a chart API body into a validated series.
///
/// Rows with any missing OHLC value are dropped. Prices are scaled by the
/// adjusted-close ratio when one is present. A repeated timestamp keeps the
/// last row (Yahoo re-emits the live bar).
pub fn parse_chart(symbol: &str, timeframe: Timeframe, body: &str) -> Result<PriceSeries> {
    let fetch_err = |reason: String| Error::DataFetch {
        symbol: symbol.to_string(),
        reason,
    };

    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| fetch_err(e.to_string()))?;
    if let Some(err) = resp.chart.error {
        return Err(fetch_err(format!("{}: {}", err.code, err.description)));
    }
    let data = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| fetch_err("empty chart result".into()))?;

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = data
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let mut rows = BTreeMap::new();
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
        ) else {
            continue;
        };
        let Some(timestamp) = Utc.timestamp_opt(ts, 0).single() else {
            continue;
        };
        let factor = match at(&adjclose, i) {
            Some(adj) if close > 0.0 && adj.is_finite() => adj / close,
            _ => 1.0,
        };
        rows.insert(
            ts,
            PriceBar {
                timestamp,
                open: open * factor,
                high: high * factor,
                low: low * factor,
                close: close * factor,
                volume: at(&quote.volume, i).unwrap_or(0.0),
            },
        );
    }

    PriceSeries::new(symbol, timeframe, rows.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "SOL-USD", "regularMarketPrice": 152.0 },
                "timestamp": [1714953600, 1714953900, 1714954200, 1714954200],
                "indicators": {
                    "quote": [{
                        "open":   [150.0, 151.0, null, 152.0],
                        "high":   [151.5, 152.0, 153.0, 152.5],
                        "low":    [149.5, 150.5, 151.0, 151.5],
                        "close":  [151.0, 151.8, 152.1, 152.0],
                        "volume": [1000, null, 900, 1200]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    fn client() -> YahooClient {
        YahooClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn chart_url_appends_symbol() {
        let url = client().chart_url("TCS.NS").unwrap();
        assert_eq!(url.as_str(), "https://query1.finance.yahoo.com/v8/finance/chart/TCS.NS");
    }

    #[test]
    fn chart_url_keeps_symbol_in_one_segment() {
        let url = client().chart_url("AB?range=max#/../x").unwrap();
        assert_eq!(url.host_str(), Some("query1.finance.yahoo.com"));
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(&segments[..3], &["v8", "finance", "chart"]);
        assert!(!segments[3].contains('/'));
        assert!(segments[3].starts_with("AB%3Frange=max%23"));
    }

    #[test]
    fn chart_url_honours_trailing_slash_in_base() {
        let url = client()
            .with_base_url("http://127.0.0.1:9000/chart/")
            .chart_url("SOL-USD")
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/chart/SOL-USD");
    }

    #[test]
    fn parses_bars_skipping_gaps_and_duplicates() {
        let series = parse_chart("SOL-USD", Timeframe::M5, BODY).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "SOL-USD");
        // Missing volume defaults to zero.
        assert_eq!(series.bars()[1].volume, 0.0);
        // The duplicate timestamp keeps the later row; the null-open row is gone.
        let last = series.last().unwrap();
        assert_eq!(last.timestamp.timestamp(), 1714954200);
        assert_eq!(last.close, 152.0);
        assert_eq!(last.volume, 1200.0);
    }

    #[test]
    fn applies_adjusted_close() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1714953600],
            "indicators":{
                "quote":[{"open":[100.0],"high":[110.0],"low":[90.0],"close":[100.0],"volume":[5]}],
                "adjclose":[{"adjclose":[50.0]}]
            }}],"error":null}}"#;
        let series = parse_chart("TCS.NS", Timeframe::D1, body).unwrap();
        let bar = series.last().unwrap();
        assert_eq!(bar.close, 50.0);
        assert_eq!(bar.high, 55.0);
    }

    #[test]
    fn chart_error_is_a_fetch_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("NOPE.NS", Timeframe::D1, body).unwrap_err();
        match err {
            Error::DataFetch { symbol, reason } => {
                assert_eq!(symbol, "NOPE.NS");
                assert!(reason.contains("delisted"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_body_is_a_fetch_error() {
        assert!(matches!(
            parse_chart("X", Timeframe::D1, "<html>"),
            Err(Error::DataFetch { .. })
        ));
    }

    #[test]
    fn no_timestamps_gives_empty_series() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        let series = parse_chart("X", Timeframe::D1, body).unwrap();
        assert!(series.is_empty());
    }
}
