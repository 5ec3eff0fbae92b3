use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use data_ingestion::{DatasetCache, Feed, load_with_period, parse_symbol_list};
use price_metrics::{
    DateMean, DerivedRow, Describe, Summary, Window, describe, filter_and_compute, mean_close_by_date,
    summarize,
};
use serde::{Deserialize, Serialize};

use crate::config::DefaultsConfig;
use crate::error::ApiError;

/// Raw query parameters of a dashboard request.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub tickers: Option<String>,
    pub symbol: Option<String>,
    pub window: Option<String>,
}

/// A validated selection: tickers to load, the one to show, and the lookback.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub tickers: Vec<String>,
    pub symbol: String,
    pub window: Window,
}

impl DashboardRequest {
    pub fn parse(params: DashboardParams, defaults: &DefaultsConfig) -> Result<Self, ApiError> {
        let tickers = parse_symbol_list(params.tickers.as_deref().unwrap_or(&defaults.tickers))?;

        let symbol = match params.symbol {
            Some(symbol) => {
                let symbol = symbol.trim();
                if symbol.is_empty() {
                    return Err(ApiError::BadRequest("symbol must not be empty".to_string()));
                }
                symbol.to_string()
            }
            None => tickers[0].clone(),
        };

        let window = params.window.as_deref().unwrap_or(&defaults.window).parse()?;

        Ok(Self {
            tickers,
            symbol,
            window,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Charts {
    pub close: Vec<ChartPoint>,
    pub volume: Vec<ChartPoint>,
    pub cumulative_pct_change: Vec<ChartPoint>,
}

impl Charts {
    fn from_rows(rows: &[DerivedRow]) -> Self {
        let series = |value: fn(&DerivedRow) -> Option<f64>| -> Vec<ChartPoint> {
            rows.iter()
                .map(|r| ChartPoint {
                    timestamp: r.timestamp,
                    value: value(r),
                })
                .collect()
        };

        Self {
            close: series(|r| Some(r.close)),
            volume: series(|r| Some(r.volume as f64)),
            cumulative_pct_change: series(|r| r.cum_pct_change),
        }
    }
}

/// Formatted day change shown next to the summary figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeLabels {
    pub change: Option<String>,
    pub pct: Option<String>,
}

/// Everything one dashboard screen shows. `summary` is `None` when the window has no rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub symbol: String,
    pub window: Window,
    pub tickers: Vec<String>,
    pub generated_at: NaiveDateTime,
    pub summary: Option<Summary>,
    pub labels: ChangeLabels,
    pub describe: Describe,
    pub mean_close_by_date: Vec<DateMean>,
    pub charts: Charts,
    pub rows: Vec<DerivedRow>,
}

impl DashboardView {
    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }
}

/// Load the requested tickers (through `cache`) and reduce the selected one to a view at `now`.
pub async fn build_dashboard<F: Feed>(
    feed: &F,
    cache: &DatasetCache,
    history: TimeDelta,
    request: &DashboardRequest,
    now: NaiveDateTime,
) -> Result<DashboardView, ApiError> {
    let dataset = load_with_period(feed, cache, &request.tickers, history).await?;
    let rows = filter_and_compute(&dataset, &request.symbol, request.window, now);

    let summary = summarize(&rows);
    let labels = summary
        .as_ref()
        .map(|s| ChangeLabels {
            change: s.change_label(),
            pct: s.pct_label(),
        })
        .unwrap_or_default();

    Ok(DashboardView {
        symbol: request.symbol.clone(),
        window: request.window,
        tickers: request.tickers.clone(),
        generated_at: now,
        summary,
        labels,
        describe: describe(&rows)?,
        mean_close_by_date: mean_close_by_date(&rows)?,
        charts: Charts::from_rows(&rows),
        rows,
    })
}

/// Dates covered by the view, for the text table heading.
pub fn date_span(view: &DashboardView) -> Option<(NaiveDate, NaiveDate)> {
    Some((view.rows.first()?.timestamp.date(), view.rows.last()?.timestamp.date()))
}
