use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Duration;

use crate::config::FeedConfig;
use crate::error::DataIngestionError;
use crate::model::{Bar, BarTimestamp};

/// Source of daily bar history.
///
/// An unknown symbol is an empty history, not an error. Implementations do not retry.
pub trait Feed: Send + Sync {
    fn fetch_history(
        &self,
        symbol: &str,
        period: TimeDelta,
    ) -> impl Future<Output = Result<Vec<Bar>, DataIngestionError>> + Send;
}

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
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
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
    volume: Vec<Option<i64>>,
}

/// Daily history from the Yahoo Finance chart endpoint.
pub struct YahooFeed {
    client: Client,
    base_url: String,
}

impl YahooFeed {
    pub fn new(config: &FeedConfig) -> Result<Self, DataIngestionError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Feed for YahooFeed {
    async fn fetch_history(
        &self,
        symbol: &str,
        period: TimeDelta,
    ) -> Result<Vec<Bar>, DataIngestionError> {
        let period2 = Utc::now();
        let period1 = period2 - period;
        let url = format!("{}/{}", self.base_url, symbol);

        debug!("Fetching {} from {}", symbol, url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.timestamp().to_string()),
                ("period2", period2.timestamp().to_string()),
                ("interval", "1d".to_string()),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        // Unknown tickers come back as 404 with a JSON error body, so the body is read
        // regardless of status.
        let body = response.text().await?;
        let bars = parse_chart(symbol, &body)?;
        if bars.is_empty() {
            warn!("Feed returned no rows for {}", symbol);
        }
        Ok(bars)
    }
}

/// Decode a chart response body into bars tagged with `symbol`.
pub fn parse_chart(symbol: &str, body: &str) -> Result<Vec<Bar>, DataIngestionError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        if error.code == "Not Found" {
            return Ok(Vec::new());
        }
        return Err(DataIngestionError::FeedError {
            symbol: symbol.to_string(),
            message: format!("{}: {}", error.code, error.description),
        });
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = FixedOffset::east_opt(data.meta.gmtoffset).ok_or_else(|| DataIngestionError::FeedError {
        symbol: symbol.to_string(),
        message: format!("invalid gmtoffset {}", data.meta.gmtoffset),
    })?;
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(data.timestamp.len());
    for (i, ts) in data.timestamp.iter().enumerate() {
        let field = |values: &Vec<Option<f64>>| values.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) =
            (field(&quote.open), field(&quote.high), field(&quote.low), field(&quote.close))
        else {
            continue;
        };
        let Some(timestamp) = trading_day(*ts, &offset) else {
            continue;
        };

        let timestamp = BarTimestamp::Aware(timestamp);
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);

        // a live session bar shares the date of the last daily bar; fold it in
        if let Some(prev) = bars.last_mut().filter(|b: &&mut Bar| b.timestamp == timestamp) {
            prev.high = prev.high.max(high);
            prev.low = prev.low.min(low);
            prev.close = close;
            prev.volume += volume;
            continue;
        }

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            symbol: symbol.to_string(),
        });
    }

    Ok(bars)
}

// Daily bars are stamped at the session open; keep only the exchange-local date.
fn trading_day(epoch_secs: i64, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let local = DateTime::from_timestamp(epoch_secs, 0)?.with_timezone(offset);
    let midnight = local.date_naive().and_hms_opt(0, 0, 0)?;
    offset.from_local_datetime(&midnight).single()
}

/// In-memory feed. Counts every call and can be told to fail specific symbols.
#[derive(Default)]
pub struct StaticFeed {
    history: HashMap<String, Vec<Bar>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bars` for `symbol`; each bar is re-tagged with `symbol`.
    pub fn with_history(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        let bars = bars
            .into_iter()
            .map(|bar| Bar {
                symbol: symbol.to_string(),
                ..bar
            })
            .collect();
        self.history.insert(symbol.to_string(), bars);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Symbols in the order they were requested.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl Feed for StaticFeed {
    async fn fetch_history(
        &self,
        symbol: &str,
        _period: TimeDelta,
    ) -> Result<Vec<Bar>, DataIngestionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(symbol.to_string());

        if self.failing.contains(symbol) {
            return Err(DataIngestionError::FeedError {
                symbol: symbol.to_string(),
                message: "feed unreachable".to_string(),
            });
        }
        Ok(self.history.get(symbol).cloned().unwrap_or_default())
    }
}
