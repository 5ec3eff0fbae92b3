use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::error::MetricsError;
use crate::misc::{ColumnStats, DateMean, Describe, DerivedRow, Summary};

/// Headline figures of the window, or `None` when it holds no rows ("no data").
pub fn summarize(rows: &[DerivedRow]) -> Option<Summary> {
    let first = rows.first()?;
    let last = rows.last()?;
    let n = rows.len() as f64;

    Some(Summary {
        last_close: last.close,
        first_open: first.open,
        max_close: rows.iter().map(|r| r.close).fold(f64::NEG_INFINITY, f64::max),
        min_close: rows.iter().map(|r| r.close).fold(f64::INFINITY, f64::min),
        mean_close: rows.iter().map(|r| r.close).sum::<f64>() / n,
        mean_volume: rows.iter().map(|r| r.volume as f64).sum::<f64>() / n,
        last_abs_change: last.abs_change,
        last_pct_change: last.pct_change,
    })
}

/// Descriptive statistics of close and volume over the window.
pub fn describe(rows: &[DerivedRow]) -> Result<Describe, MetricsError> {
    let close: Vec<f64> = rows.iter().map(|r| r.close).collect();
    let volume: Vec<f64> = rows.iter().map(|r| r.volume as f64).collect();

    Ok(Describe {
        close: column_stats("close", &close)?,
        volume: column_stats("volume", &volume)?,
    })
}

fn column_stats(name: &str, values: &[f64]) -> Result<ColumnStats, MetricsError> {
    if values.is_empty() {
        return Ok(ColumnStats::default());
    }

    let ca = Float64Chunked::from_slice(name, values);
    let quantile = |q: f64| -> Result<Option<f64>, MetricsError> {
        Ok(ca.quantile(q, QuantileInterpolOptions::Linear)?.map(round2))
    };

    Ok(ColumnStats {
        count: ca.len(),
        mean: ca.mean().map(round2),
        // sample deviation; undefined below two observations
        std: if ca.len() > 1 { ca.std(1).map(round2) } else { None },
        min: ca.min().map(round2),
        q25: quantile(0.25)?,
        q50: quantile(0.5)?,
        q75: quantile(0.75)?,
        max: ca.max().map(round2),
    })
}

// half-to-even, so ties land where a dataframe `round(2)` puts them
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Mean close per calendar date, ascending.
pub fn mean_close_by_date(rows: &[DerivedRow]) -> Result<Vec<DateMean>, MetricsError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let days: Vec<i32> = rows.iter().map(|r| r.timestamp.date().num_days_from_ce()).collect();
    let close: Vec<f64> = rows.iter().map(|r| r.close).collect();
    let df = DataFrame::new(vec![
        Series::new("day".into(), days),
        Series::new("close".into(), close),
    ])?;

    // rows arrive ascending, so first-seen group order is date order
    let grouped = df
        .lazy()
        .group_by_stable([col("day")])
        .agg([col("close").mean().alias("mean_close")])
        .collect()?;

    let days = grouped.column("day")?.i32()?;
    let means = grouped.column("mean_close")?.f64()?;

    Ok(days
        .into_iter()
        .zip(means.into_iter())
        .filter_map(|(day, mean)| {
            Some(DateMean {
                date: NaiveDate::from_num_days_from_ce_opt(day?)?,
                mean_close: mean?,
            })
        })
        .collect())
}

/// Raw-data table of the window: date, open, close, volume and the two change columns.
pub fn to_frame(rows: &[DerivedRow]) -> Result<DataFrame, MetricsError> {
    let date: Vec<String> = rows.iter().map(|r| r.timestamp.format("%Y-%m-%d").to_string()).collect();
    let open: Vec<f64> = rows.iter().map(|r| r.open).collect();
    let close: Vec<f64> = rows.iter().map(|r| r.close).collect();
    let volume: Vec<i64> = rows.iter().map(|r| r.volume).collect();
    let abs_change: Vec<Option<f64>> = rows.iter().map(|r| r.abs_change).collect();
    let pct_change: Vec<Option<f64>> = rows.iter().map(|r| r.pct_change).collect();

    let df = DataFrame::new(vec![
        Series::new("date".into(), date),
        Series::new("open".into(), open),
        Series::new("close".into(), close),
        Series::new("volume".into(), volume),
        Series::new("abs_change".into(), abs_change),
        Series::new("pct_change".into(), pct_change),
    ])?;
    Ok(df)
}
