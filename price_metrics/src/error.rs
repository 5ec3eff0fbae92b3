use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Unknown window {0:?}; expected one of: 5 days, 1 month, 2 months, 3 months, 6 months, 1 year")]
    UnknownWindow(String),

    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}
