use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataIngestionError {
    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Config not found: {0}")]
    ConfigValueNotFoundError(#[from] config::ConfigError),

    #[error("Feed error for {symbol}: {message}")]
    FeedError { symbol: String, message: String },

    #[error("No symbols given: expected a comma-separated list such as \"PETR4.SA, VALE3.SA\"")]
    EmptySymbolList,
}

impl DataIngestionError {
    /// True for failures of the feed itself, as opposed to bad caller input.
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            DataIngestionError::ReqwestError(_)
                | DataIngestionError::SerdeJsonError(_)
                | DataIngestionError::FeedError { .. }
        )
    }
}
