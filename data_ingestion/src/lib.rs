pub mod config;
pub mod error;
pub mod fetcher;
pub mod loader;
pub mod logger;
pub mod model;

pub use error::DataIngestionError;
pub use fetcher::{Feed, StaticFeed, YahooFeed};
pub use loader::{DatasetCache, load, load_with_period, parse_symbol_list};
pub use model::{Bar, BarTimestamp, Dataset};
