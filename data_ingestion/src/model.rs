use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp of a bar as delivered by the feed.
///
/// Feeds may hand out exchange-local aware instants or plain wall-clock readings;
/// both are kept as received and only collapsed by [`BarTimestamp::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BarTimestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl BarTimestamp {
    /// Wall-clock reading with any offset dropped (the same instant as seen locally).
    pub fn normalized(&self) -> NaiveDateTime {
        match self {
            BarTimestamp::Aware(dt) => dt.naive_local(),
            BarTimestamp::Naive(dt) => *dt,
        }
    }
}

impl From<DateTime<FixedOffset>> for BarTimestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        BarTimestamp::Aware(value)
    }
}

impl From<NaiveDateTime> for BarTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        BarTimestamp::Naive(value)
    }
}

/// One trading day for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: BarTimestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub symbol: String,
}

/// Bars of every requested symbol, concatenated in request order.
///
/// Rows of one symbol are ascending by timestamp. Nothing orders rows across symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    bars: Vec<Bar>,
}

impl Dataset {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Rows whose symbol equals `symbol` exactly (case-sensitive).
    pub fn rows_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a Bar> + 'a {
        self.bars.iter().filter(move |bar| bar.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn bar(symbol: &str, day: u32, close: f64) -> Bar {
        let ts = NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        Bar {
            timestamp: ts.into(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10,
            symbol: symbol.to_string(),
        }
    }

    #[test]
    fn aware_timestamp_keeps_wall_clock_reading() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let aware = offset.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 3, 4)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();

        assert_eq!(BarTimestamp::from(aware).normalized(), naive);
        assert_eq!(BarTimestamp::from(naive).normalized(), naive);
        assert!(matches!(BarTimestamp::from(aware), BarTimestamp::Aware(_)));
    }

    #[test]
    fn rows_for_is_exact_and_case_sensitive() {
        let ds = Dataset::new(vec![bar("PETR4.SA", 1, 1.0), bar("petr4.sa", 1, 2.0), bar("PETR4.SA", 2, 3.0)]);

        let closes: Vec<f64> = ds.rows_for("PETR4.SA").map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 3.0]);
        assert_eq!(ds.rows_for("PETR4").count(), 0);
    }
}
