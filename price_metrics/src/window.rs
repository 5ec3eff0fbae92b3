use chrono::{NaiveDateTime, TimeDelta};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::MetricsError;

/// Trailing lookback selectable on the dashboard.
///
/// Offsets are calendar days (a month is 30 days), not trading sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    FiveDays,
    OneMonth,
    TwoMonths,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Window {
    pub const ALL: [Window; 6] = [
        Window::FiveDays,
        Window::OneMonth,
        Window::TwoMonths,
        Window::ThreeMonths,
        Window::SixMonths,
        Window::OneYear,
    ];

    pub fn days(self) -> i64 {
        match self {
            Window::FiveDays => 5,
            Window::OneMonth => 30,
            Window::TwoMonths => 60,
            Window::ThreeMonths => 90,
            Window::SixMonths => 180,
            Window::OneYear => 365,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Window::FiveDays => "5 days",
            Window::OneMonth => "1 month",
            Window::TwoMonths => "2 months",
            Window::ThreeMonths => "3 months",
            Window::SixMonths => "6 months",
            Window::OneYear => "1 year",
        }
    }

    fn aliases(self) -> [&'static str; 2] {
        match self {
            Window::FiveDays => ["5d", "5 dias"],
            Window::OneMonth => ["1mo", "1 mês"],
            Window::TwoMonths => ["2mo", "2 meses"],
            Window::ThreeMonths => ["3mo", "3 meses"],
            Window::SixMonths => ["6mo", "6 meses"],
            Window::OneYear => ["1y", "1 ano"],
        }
    }

    /// Earliest timestamp kept when the dashboard is viewed at `now`.
    pub fn cutoff(self, now: NaiveDateTime) -> NaiveDateTime {
        now - TimeDelta::days(self.days())
    }
}

impl FromStr for Window {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Window::ALL
            .into_iter()
            .find(|w| w.label() == wanted || w.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| MetricsError::UnknownWindow(s.to_string()))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Window {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn day_offsets() {
        let days: Vec<i64> = Window::ALL.iter().map(|w| w.days()).collect();
        assert_eq!(days, vec![5, 30, 60, 90, 180, 365]);
    }

    #[test]
    fn parses_labels_codes_and_portuguese() {
        assert_eq!("5 days".parse::<Window>().unwrap(), Window::FiveDays);
        assert_eq!(" 1 Month ".parse::<Window>().unwrap(), Window::OneMonth);
        assert_eq!("3mo".parse::<Window>().unwrap(), Window::ThreeMonths);
        assert_eq!("1 mês".parse::<Window>().unwrap(), Window::OneMonth);
        assert_eq!("6 meses".parse::<Window>().unwrap(), Window::SixMonths);
        assert_eq!("1Y".parse::<Window>().unwrap(), Window::OneYear);

        for w in Window::ALL {
            assert_eq!(w.to_string().parse::<Window>().unwrap(), w);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "2 weeks".parse::<Window>().unwrap_err();
        assert!(matches!(err, MetricsError::UnknownWindow(ref s) if s == "2 weeks"));
        assert!(err.to_string().contains("1 month"));
    }

    #[test]
    fn cutoff_subtracts_calendar_days() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap().and_hms_opt(15, 30, 0).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(15, 30, 0).unwrap();
        assert_eq!(Window::OneMonth.cutoff(now), expected);
    }
}
