use config::ConfigError;
use data_ingestion::config::{FeedConfig, settings};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Selections used when a request leaves them out.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    pub tickers: String,
    pub window: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub defaults: DefaultsConfig,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        settings()?.try_deserialize()
    }
}
