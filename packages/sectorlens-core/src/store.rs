//! Price series collaborator and an in-memory implementation.

use crate::types::{DateRange, PriceSeries};
use crate::Result;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Supplier of daily closing prices.
///
/// Partial failures are tolerated: a ticker without data is simply absent
/// from the returned map.
pub trait PriceSeriesStore: Send + Sync {
    fn fetch_price_series(
        &self,
        tickers: &[String],
        range: &DateRange,
    ) -> HashMap<String, PriceSeries>;
}

impl<T: PriceSeriesStore + ?Sized> PriceSeriesStore for &T {
    fn fetch_price_series(
        &self,
        tickers: &[String],
        range: &DateRange,
    ) -> HashMap<String, PriceSeries> {
        (**self).fetch_price_series(tickers, range)
    }
}

/// Price series held in memory, typically loaded from a JSON snapshot.
///
/// Snapshot format: `{"TICKER": [{"date": "2024-01-02", "price": 101.5}, ...]}`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceStore {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON snapshot from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a JSON snapshot.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, PriceSeries> = serde_json::from_str(content)?;
        let mut store = Self::new();
        for (ticker, series) in raw {
            store.insert(&ticker, series);
        }
        Ok(store)
    }

    /// Add (or replace) the series for a ticker.
    pub fn insert(&mut self, ticker: &str, series: PriceSeries) {
        self.series.insert(ticker.trim().to_uppercase(), series);
    }

    pub fn with_series(mut self, ticker: &str, series: PriceSeries) -> Self {
        self.insert(ticker, series);
        self
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl PriceSeriesStore for InMemoryPriceStore {
    fn fetch_price_series(
        &self,
        tickers: &[String],
        range: &DateRange,
    ) -> HashMap<String, PriceSeries> {
        tickers
            .iter()
            .filter_map(|ticker| {
                let key = ticker.trim().to_uppercase();
                let window = self.series.get(&key)?.within(range);
                if window.is_empty() {
                    return None;
                }
                Some((key, window))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_fetch_filters_range_and_skips_missing() {
        let store = InMemoryPriceStore::new()
            .with_series("aaa", PriceSeries::daily(day(1), &[1.0, 2.0, 3.0, 4.0]).unwrap())
            .with_series("BBB", PriceSeries::daily(day(20), &[5.0, 6.0]).unwrap());

        let range = DateRange::new(day(2), day(3)).unwrap();
        let tickers = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
        let fetched = store.fetch_price_series(&tickers, &range);

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched["AAA"].len(), 2);
        assert!(!fetched.contains_key("BBB"));
        assert!(!fetched.contains_key("CCC"));
    }

    #[test]
    fn test_load_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.json");
        fs::write(
            &path,
            r#"{"spy": [{"date": "2024-03-01", "price": 500.0}, {"date": "2024-03-04", "price": 505.0}]}"#,
        )
        .unwrap();

        let store = InMemoryPriceStore::load_from_path(&path).unwrap();
        assert_eq!(store.len(), 1);

        let range = DateRange::new(day(1), day(31)).unwrap();
        let fetched = store.fetch_price_series(&["SPY".to_string()], &range);
        assert_eq!(fetched["SPY"].len(), 2);
    }

    #[test]
    fn test_invalid_snapshot() {
        let result = InMemoryPriceStore::from_json(r#"{"X": [{"date": "2024-03-01", "price": -1.0}]}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
