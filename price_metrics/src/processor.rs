use chrono::NaiveDateTime;
use data_ingestion::model::{Bar, Dataset};

use crate::misc::DerivedRow;
use crate::window::Window;

/// Rows of `symbol` inside `window` as seen at `now`, with day-over-day changes.
///
/// Timestamps are compared and returned without their offset. A symbol with no rows, or a
/// window that excludes every row, yields an empty Vec.
pub fn filter_and_compute(
    dataset: &Dataset,
    symbol: &str,
    window: Window,
    now: NaiveDateTime,
) -> Vec<DerivedRow> {
    let cutoff = window.cutoff(now);

    let mut selected: Vec<(NaiveDateTime, &Bar)> = dataset
        .rows_for(symbol)
        .map(|bar| (bar.timestamp.normalized(), bar))
        .filter(|(ts, _)| *ts >= cutoff)
        .collect();
    selected.sort_by_key(|(ts, _)| *ts);

    derive_changes(selected)
}

fn derive_changes(selected: Vec<(NaiveDateTime, &Bar)>) -> Vec<DerivedRow> {
    let mut rows = Vec::with_capacity(selected.len());
    let mut prev_close: Option<f64> = None;
    let mut running = 0.0;

    for (timestamp, bar) in selected {
        let abs_change = prev_close.map(|prev| bar.close - prev);
        let pct_change = match (abs_change, prev_close) {
            (Some(change), Some(prev)) if prev != 0.0 => Some(change / prev * 100.0),
            _ => None,
        };
        // absent changes neither reset nor feed the running sum
        let cum_pct_change = pct_change.map(|pct| {
            running += pct;
            running
        });

        rows.push(DerivedRow {
            timestamp,
            symbol: bar.symbol.clone(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            abs_change,
            pct_change,
            cum_pct_change,
        });
        prev_close = Some(bar.close);
    }

    rows
}
