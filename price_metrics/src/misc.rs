use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A bar inside the selected window, with its day-over-day changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRow {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    /// `close - previous close`; absent on the first row of the window.
    pub abs_change: Option<f64>,
    /// Percent change against the previous close; absent when there is none or it is zero.
    pub pct_change: Option<f64>,
    /// Running sum of `pct_change`, absent wherever `pct_change` is.
    pub cum_pct_change: Option<f64>,
}

/// Headline figures of a non-empty window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub last_close: f64,
    pub first_open: f64,
    pub max_close: f64,
    pub min_close: f64,
    pub mean_close: f64,
    pub mean_volume: f64,
    pub last_abs_change: Option<f64>,
    pub last_pct_change: Option<f64>,
}

impl Summary {
    /// Signed day change, e.g. `+5.00` or `-10.00`.
    pub fn change_label(&self) -> Option<String> {
        self.last_abs_change.map(|v| {
            if v > 0.0 {
                format!("+{v:.2}")
            } else {
                format!("{v:.2}")
            }
        })
    }

    /// Day change in percent, e.g. `(-9.52%)`.
    pub fn pct_label(&self) -> Option<String> {
        self.last_pct_change.map(|v| format!("({v:.2}%)"))
    }
}

/// count / mean / std / min / quartiles / max of one column, rounded to cents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub q50: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Describe {
    pub close: ColumnStats,
    pub volume: ColumnStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateMean {
    pub date: NaiveDate,
    pub mean_close: f64,
}
