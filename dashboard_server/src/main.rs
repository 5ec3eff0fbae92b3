mod config;
mod dashboard;
mod error;
mod server;

use crate::config::DashboardConfig;
use crate::server::Server;
use anyhow::Result;
use data_ingestion::logger::init_logger;
use data_ingestion::{DatasetCache, YahooFeed};
use log::*;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let config = DashboardConfig::from_env()?;
    info!(
        "Default tickers: {}, window: {}",
        config.defaults.tickers, config.defaults.window
    );

    let feed = YahooFeed::new(&config.feed)?;
    let server = Server::init(feed, DatasetCache::new(), config);

    tokio::select! {
        // Handle shutdown signal
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, initiating graceful shutdown");
        }
        res = server.run() => {
            if let Err(e) = res {
                error!("Server failed: {:?}", e);
                return Err(e);
            }
        }
    }

    info!("Dashboard server has been shut down!");
    Ok(())
}
