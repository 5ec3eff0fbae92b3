use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;

pub const DEFAULT_CONFIG_PATH: &str = "dashboard.toml";
pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Layered settings: built-in defaults, then the optional TOML file
/// (`DASHBOARD_CONFIG` or `dashboard.toml`), then `DASHBOARD_<SECTION>__<KEY>` variables.
pub fn settings() -> Result<Config, ConfigError> {
    let path = env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    settings_from(&path)
}

pub fn settings_from(path: &str) -> Result<Config, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000_i64)?
        .set_default("feed.base_url", YAHOO_CHART_URL)?
        .set_default("feed.user_agent", "Mozilla/5.0")?
        .set_default("feed.timeout_secs", 10_i64)?
        .set_default("feed.history_days", 365_i64)?
        .set_default("defaults.tickers", "^BVSP, ITUB4.SA, PETR4.SA, VALE3.SA")?
        .set_default("defaults.window", "1 month")?
        .add_source(File::new(path, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("DASHBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub history_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let cfg = settings_from("does-not-exist.toml").unwrap();
        let feed: FeedConfig = cfg.get("feed").unwrap();

        assert_eq!(feed.base_url, YAHOO_CHART_URL);
        assert_eq!(feed.timeout_secs, 10);
        assert_eq!(feed.history_days, 365);
        assert_eq!(cfg.get_string("defaults.window").unwrap(), "1 month");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let path = env::temp_dir().join(format!("dashboard-cfg-{}.toml", std::process::id()));
        std::fs::write(&path, "[feed]\ntimeout_secs = 3\nhistory_days = 30\n").unwrap();

        let cfg = settings_from(path.to_str().unwrap()).unwrap();
        let feed: FeedConfig = cfg.get("feed").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(feed.timeout_secs, 3);
        assert_eq!(feed.history_days, 30);
        assert_eq!(feed.user_agent, "Mozilla/5.0");
    }
}
