use chrono::TimeDelta;
use futures_util::future::try_join_all;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DataIngestionError;
use crate::fetcher::Feed;
use crate::model::Dataset;

pub const DEFAULT_HISTORY_DAYS: i64 = 365;

/// Memoized datasets keyed by the exact ordered symbol list.
///
/// Entries go in whole under the write lock and are never mutated afterwards. There is no
/// eviction: callers own the cache and decide its lifetime.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<Vec<String>, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[String]) -> Option<Arc<Dataset>> {
        self.entries.read().get(key).cloned()
    }

    /// Store `dataset` unless another load already stored one for `key`; returns the stored entry.
    pub fn insert(&self, key: Vec<String>, dataset: Dataset) -> Arc<Dataset> {
        self.entries
            .write()
            .entry(key)
            .or_insert_with(|| Arc::new(dataset))
            .clone()
    }

    pub fn invalidate(&self, key: &[String]) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every entry, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Split a user-typed ticker list on commas. Blank pieces are dropped; duplicates are kept.
pub fn parse_symbol_list(input: &str) -> Result<Vec<String>, DataIngestionError> {
    let symbols: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if symbols.is_empty() {
        return Err(DataIngestionError::EmptySymbolList);
    }
    Ok(symbols)
}

/// Load one year of daily bars for `symbols`, reusing `cache` when the same list was loaded before.
pub async fn load<F: Feed>(
    feed: &F,
    cache: &DatasetCache,
    symbols: &[String],
) -> Result<Arc<Dataset>, DataIngestionError> {
    load_with_period(feed, cache, symbols, TimeDelta::days(DEFAULT_HISTORY_DAYS)).await
}

pub async fn load_with_period<F: Feed>(
    feed: &F,
    cache: &DatasetCache,
    symbols: &[String],
    period: TimeDelta,
) -> Result<Arc<Dataset>, DataIngestionError> {
    if symbols.is_empty() {
        return Err(DataIngestionError::EmptySymbolList);
    }

    if let Some(dataset) = cache.get(symbols) {
        debug!("Cache hit for {:?}", symbols);
        return Ok(dataset);
    }

    info!("Loading history for {:?}", symbols);
    let histories = try_join_all(symbols.iter().map(|s| feed.fetch_history(s, period))).await?;

    let mut bars = Vec::with_capacity(histories.iter().map(Vec::len).sum());
    for (symbol, history) in symbols.iter().zip(histories) {
        if history.is_empty() {
            warn!("No rows for {}", symbol);
        }
        bars.extend(history.into_iter().map(|mut bar| {
            bar.symbol = symbol.clone();
            bar
        }));
    }

    let dataset = cache.insert(symbols.to_vec(), Dataset::new(bars));
    info!("Loaded {} rows for {} symbols", dataset.len(), symbols.len());
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::StaticFeed;
    use crate::model::Bar;
    use chrono::NaiveDate;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: NaiveDate::from_ymd_opt(2024, 5, 1 + i as u32)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .unwrap()
                    .into(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 100,
                symbol: String::new(),
            })
            .collect()
    }

    fn key(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn second_load_is_served_from_cache() {
        let feed = StaticFeed::new()
            .with_history("A", bars(&[1.0, 2.0]))
            .with_history("B", bars(&[3.0]));
        let cache = DatasetCache::new();
        let symbols = key(&["A", "B"]);

        let first = load(&feed, &cache, &symbols).await.unwrap();
        assert_eq!(feed.calls(), 2);

        let second = load(&feed, &cache, &symbols).await.unwrap();
        assert_eq!(feed.calls(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn key_is_the_ordered_list() {
        let feed = StaticFeed::new()
            .with_history("A", bars(&[1.0]))
            .with_history("B", bars(&[2.0]));
        let cache = DatasetCache::new();

        load(&feed, &cache, &key(&["A", "B"])).await.unwrap();
        let reversed = load(&feed, &cache, &key(&["B", "A"])).await.unwrap();

        assert_eq!(feed.calls(), 4);
        assert_eq!(cache.len(), 2);
        let order: Vec<&str> = reversed.bars().iter().map(|b| b.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn rows_are_tagged_and_concatenated_in_request_order() {
        let feed = StaticFeed::new()
            .with_history("VALE3.SA", bars(&[60.0, 61.0]))
            .with_history("^BVSP", bars(&[128_000.0]));
        let cache = DatasetCache::new();

        let ds = load(&feed, &cache, &key(&["^BVSP", "VALE3.SA"])).await.unwrap();

        let tagged: Vec<(&str, f64)> = ds.bars().iter().map(|b| (b.symbol.as_str(), b.close)).collect();
        assert_eq!(tagged, vec![("^BVSP", 128_000.0), ("VALE3.SA", 60.0), ("VALE3.SA", 61.0)]);
    }

    #[tokio::test]
    async fn symbol_without_rows_contributes_nothing() {
        let feed = StaticFeed::new().with_history("A", bars(&[1.0]));
        let cache = DatasetCache::new();

        let ds = load(&feed, &cache, &key(&["A", "INVALID"])).await.unwrap();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.rows_for("INVALID").count(), 0);
        assert_eq!(feed.requested(), vec!["A", "INVALID"]);
    }

    #[tokio::test]
    async fn failures_propagate_and_are_not_cached() {
        let feed = StaticFeed::new().with_history("A", bars(&[1.0])).failing("DOWN");
        let cache = DatasetCache::new();

        let err = load(&feed, &cache, &key(&["A", "DOWN"])).await.unwrap_err();

        assert!(err.is_retrieval());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn empty_symbol_list_is_rejected() {
        let feed = StaticFeed::new();
        let cache = DatasetCache::new();

        let err = load(&feed, &cache, &[]).await.unwrap_err();

        assert!(matches!(err, DataIngestionError::EmptySymbolList));
        assert_eq!(feed.calls(), 0);
    }

    #[tokio::test]
    async fn invalidation_forces_a_refetch() {
        let feed = StaticFeed::new().with_history("A", bars(&[1.0]));
        let cache = DatasetCache::new();
        let symbols = key(&["A"]);

        load(&feed, &cache, &symbols).await.unwrap();
        assert!(cache.invalidate(&symbols));
        load(&feed, &cache, &symbols).await.unwrap();

        assert_eq!(feed.calls(), 2);
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn first_insert_wins() {
        let cache = DatasetCache::new();
        let first = cache.insert(key(&["A"]), Dataset::new(bars(&[1.0])));
        let second = cache.insert(key(&["A"]), Dataset::new(bars(&[2.0, 3.0])));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn symbol_list_parsing() {
        assert_eq!(
            parse_symbol_list("^BVSP, ITUB4.SA,PETR4.SA , VALE3.SA").unwrap(),
            key(&["^BVSP", "ITUB4.SA", "PETR4.SA", "VALE3.SA"])
        );
        assert_eq!(parse_symbol_list("A,,B,").unwrap(), key(&["A", "B"]));
        assert!(matches!(parse_symbol_list(" , "), Err(DataIngestionError::EmptySymbolList)));
        assert!(parse_symbol_list("").is_err());
    }
}
