//! Ticker to sector classification and portfolio sector exposure.

use crate::types::Portfolio;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

const UNKNOWN_LABEL: &str = "Unknown";

/// Sector metadata collaborator.
///
/// Implementations may fail or return nothing; [`SectorClassifier`] turns
/// both into [`SectorLabel::Unknown`].
pub trait SectorSource: Send + Sync {
    fn fetch_sector(&self, ticker: &str) -> Result<Option<String>>;
}

impl<T: SectorSource + ?Sized> SectorSource for &T {
    fn fetch_sector(&self, ticker: &str) -> Result<Option<String>> {
        (**self).fetch_sector(ticker)
    }
}

/// A sector label, or `Unknown` when the sector could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectorLabel {
    Known(String),
    Unknown,
}

impl SectorLabel {
    /// Parse a label; blank text and `"Unknown"` map to [`SectorLabel::Unknown`].
    pub fn new(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == UNKNOWN_LABEL {
            SectorLabel::Unknown
        } else {
            SectorLabel::Known(label.to_string())
        }
    }

    /// Label text; `"Unknown"` for [`SectorLabel::Unknown`].
    pub fn as_str(&self) -> &str {
        match self {
            SectorLabel::Known(label) => label,
            SectorLabel::Unknown => UNKNOWN_LABEL,
        }
    }

    /// True for [`SectorLabel::Unknown`].
    pub fn is_unknown(&self) -> bool {
        matches!(self, SectorLabel::Unknown)
    }

    /// True when this is the known sector `name`.
    pub fn is(&self, name: &str) -> bool {
        matches!(self, SectorLabel::Known(label) if label == name)
    }
}

impl From<String> for SectorLabel {
    fn from(label: String) -> Self {
        SectorLabel::new(&label)
    }
}

impl From<SectorLabel> for String {
    fn from(label: SectorLabel) -> Self {
        match label {
            SectorLabel::Known(label) => label,
            SectorLabel::Unknown => UNKNOWN_LABEL.to_string(),
        }
    }
}

impl fmt::Display for SectorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sector lookups memoized for one analysis run.
///
/// Owned by the caller and passed by `&mut`, so no lookup state outlives the
/// run unless the caller keeps the cache.
#[derive(Debug, Clone, Default)]
pub struct SectorCache {
    entries: HashMap<String, SectorLabel>,
}

impl SectorCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached label for `ticker` (case-insensitive).
    pub fn get(&self, ticker: &str) -> Option<&SectorLabel> {
        self.entries.get(&ticker.trim().to_uppercase())
    }

    /// Memoize the label for `ticker`.
    pub fn insert(&mut self, ticker: &str, label: SectorLabel) {
        self.entries.insert(ticker.trim().to_uppercase(), label);
    }

    /// Number of memoized tickers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been looked up yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ticker to sector mapping for one analysis run.
pub type SectorMap = BTreeMap<String, SectorLabel>;

/// Aggregated portfolio weight per sector.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SectorExposure {
    weights: BTreeMap<SectorLabel, f64>,
}

impl SectorExposure {
    /// Sum holding weights per sector; tickers missing from `sectors` count as `Unknown`.
    pub fn from_sector_map(portfolio: &Portfolio, sectors: &SectorMap) -> Self {
        let mut weights: BTreeMap<SectorLabel, f64> = BTreeMap::new();
        for holding in portfolio.holdings() {
            let label = sectors
                .get(&holding.ticker)
                .cloned()
                .unwrap_or(SectorLabel::Unknown);
            *weights.entry(label).or_insert(0.0) += holding.weight;
        }
        Self { weights }
    }

    /// Weight held in `label`, zero when absent.
    pub fn get(&self, label: &SectorLabel) -> f64 {
        self.weights.get(label).copied().unwrap_or(0.0)
    }

    /// Weight held in the known sector `name`.
    pub fn weight_of(&self, name: &str) -> f64 {
        self.get(&SectorLabel::new(name))
    }

    /// Sum of all sector weights.
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// `(sector, weight)` pairs ordered by label.
    pub fn iter(&self) -> impl Iterator<Item = (&SectorLabel, f64)> {
        self.weights.iter().map(|(label, weight)| (label, *weight))
    }

    /// Number of sectors held.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True for an empty exposure.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sectors sorted by weight, largest first.
    pub fn sorted_by_weight(&self) -> Vec<(SectorLabel, f64)> {
        let mut sorted: Vec<(SectorLabel, f64)> = self
            .weights
            .iter()
            .map(|(label, weight)| (label.clone(), *weight))
            .collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}

/// Resolves tickers to sectors through a [`SectorSource`].
#[derive(Debug, Clone)]
pub struct SectorClassifier<S> {
    source: S,
}

impl<S: SectorSource> SectorClassifier<S> {
    /// Classifier over `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The underlying sector source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Sector of `ticker`, never failing.
    ///
    /// Lookup errors, missing values and blank labels all resolve to
    /// [`SectorLabel::Unknown`]. Results are memoized in `cache`.
    pub fn sector_of(&self, ticker: &str, cache: &mut SectorCache) -> SectorLabel {
        let ticker = ticker.trim().to_uppercase();
        if let Some(label) = cache.get(&ticker) {
            return label.clone();
        }

        let label = match self.source.fetch_sector(&ticker) {
            Ok(Some(sector)) => SectorLabel::new(&sector),
            Ok(None) => {
                tracing::debug!(ticker = %ticker, "no sector metadata, using Unknown");
                SectorLabel::Unknown
            }
            Err(e) => {
                tracing::debug!(ticker = %ticker, error = %e, "sector lookup failed, using Unknown");
                SectorLabel::Unknown
            }
        };

        cache.insert(&ticker, label.clone());
        label
    }

    /// Sector of every ticker.
    pub fn sector_map<T: AsRef<str>>(&self, tickers: &[T], cache: &mut SectorCache) -> SectorMap {
        tickers
            .iter()
            .map(|t| {
                let ticker = t.as_ref().trim().to_uppercase();
                let label = self.sector_of(&ticker, cache);
                (ticker, label)
            })
            .collect()
    }

    /// Portfolio weight aggregated per sector.
    pub fn portfolio_sector_weights(
        &self,
        portfolio: &Portfolio,
        cache: &mut SectorCache,
    ) -> SectorExposure {
        let sectors = self.sector_map(&portfolio.tickers(), cache);
        SectorExposure::from_sector_map(portfolio, &sectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use approx::assert_abs_diff_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MapSource {
        sectors: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl MapSource {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                sectors: pairs
                    .iter()
                    .map(|(t, s)| (t.to_string(), s.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SectorSource for MapSource {
        fn fetch_sector(&self, ticker: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker == "BROKEN" {
                return Err(Error::DataUnavailable("metadata service down".to_string()));
            }
            Ok(self.sectors.get(ticker).cloned())
        }
    }

    #[test]
    fn test_sector_label_parsing() {
        assert_eq!(SectorLabel::new("IT"), SectorLabel::Known("IT".to_string()));
        assert_eq!(SectorLabel::new("  "), SectorLabel::Unknown);
        assert_eq!(SectorLabel::new("Unknown"), SectorLabel::Unknown);
        assert_eq!(SectorLabel::Unknown.to_string(), "Unknown");
        assert!(SectorLabel::new("IT").is("IT"));
        assert!(!SectorLabel::Unknown.is("Unknown"));
    }

    #[test]
    fn test_sector_of_degrades_to_unknown() {
        let classifier = SectorClassifier::new(MapSource::new(&[("TCS", "IT"), ("BLANK", " ")]));
        let mut cache = SectorCache::new();

        assert!(classifier.sector_of("TCS", &mut cache).is("IT"));
        assert!(classifier.sector_of("MISSING", &mut cache).is_unknown());
        assert!(classifier.sector_of("BROKEN", &mut cache).is_unknown());
        assert!(classifier.sector_of("BLANK", &mut cache).is_unknown());
    }

    #[test]
    fn test_sector_of_uses_cache() {
        let classifier = SectorClassifier::new(MapSource::new(&[("TCS", "IT")]));
        let mut cache = SectorCache::new();

        classifier.sector_of("TCS", &mut cache);
        classifier.sector_of("TCS", &mut cache);
        classifier.sector_of("tcs", &mut cache);

        assert_eq!(classifier.source().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sector_of_normalizes_before_lookup() {
        let classifier = SectorClassifier::new(MapSource::new(&[("TCS", "IT")]));
        let mut cache = SectorCache::new();

        // Lowercase spelling first must not memoize Unknown
        assert!(classifier.sector_of(" tcs ", &mut cache).is("IT"));
        assert!(classifier.sector_of("TCS", &mut cache).is("IT"));
        assert_eq!(classifier.source().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_portfolio_sector_weights_sum_to_one() {
        let classifier = SectorClassifier::new(MapSource::new(&[
            ("TCS", "IT"),
            ("INFY", "IT"),
            ("HDFCBANK", "Banking"),
        ]));
        let portfolio = Portfolio::new(vec![
            ("TCS", 0.2),
            ("INFY", 0.15),
            ("HDFCBANK", 0.35),
            ("MYSTERY", 0.1),
            ("BROKEN", 0.2),
        ])
        .unwrap();

        let exposure = classifier.portfolio_sector_weights(&portfolio, &mut SectorCache::new());

        assert_abs_diff_eq!(exposure.total(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(exposure.weight_of("IT"), 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(exposure.weight_of("Banking"), 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(exposure.get(&SectorLabel::Unknown), 0.3, epsilon = 1e-12);
        assert_eq!(exposure.weight_of("Pharma"), 0.0);
    }

    #[test]
    fn test_portfolio_sector_weights_order_independent() {
        let classifier = SectorClassifier::new(MapSource::new(&[("A", "X"), ("B", "Y"), ("C", "X")]));
        let forward = Portfolio::new(vec![("A", 0.1), ("B", 0.6), ("C", 0.3)]).unwrap();
        let backward = Portfolio::new(vec![("C", 0.3), ("B", 0.6), ("A", 0.1)]).unwrap();

        let a = classifier.portfolio_sector_weights(&forward, &mut SectorCache::new());
        let b = classifier.portfolio_sector_weights(&backward, &mut SectorCache::new());

        for (label, weight) in a.iter() {
            assert_abs_diff_eq!(b.get(label), weight, epsilon = 1e-12);
        }
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_portfolio_sector_weights_scale_invariant() {
        let classifier = SectorClassifier::new(MapSource::new(&[("A", "X"), ("B", "Y"), ("C", "X")]));
        let unit = Portfolio::new(vec![("A", 0.2), ("B", 0.5), ("C", 0.3)]).unwrap();
        let doubled = Portfolio::new(vec![("A", 0.4), ("B", 1.0), ("C", 0.6)]).unwrap();

        let a = classifier.portfolio_sector_weights(&unit, &mut SectorCache::new());
        let b = classifier.portfolio_sector_weights(&doubled, &mut SectorCache::new());

        assert_eq!(a.len(), b.len());
        for (label, weight) in a.iter() {
            assert_abs_diff_eq!(b.get(label), weight, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(b.weight_of("X"), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sorted_by_weight() {
        let classifier = SectorClassifier::new(MapSource::new(&[("A", "X"), ("B", "Y")]));
        let portfolio = Portfolio::new(vec![("A", 0.25), ("B", 0.75)]).unwrap();
        let exposure = classifier.portfolio_sector_weights(&portfolio, &mut SectorCache::new());

        let sorted = exposure.sorted_by_weight();
        assert!(sorted[0].0.is("Y"));
        assert!(sorted[1].0.is("X"));
    }

    #[test]
    fn test_exposure_serializes_with_string_keys() {
        let classifier = SectorClassifier::new(MapSource::new(&[("A", "IT")]));
        let portfolio = Portfolio::new(vec![("A", 0.5), ("B", 0.5)]).unwrap();
        let exposure = classifier.portfolio_sector_weights(&portfolio, &mut SectorCache::new());

        let json = serde_json::to_value(&exposure).unwrap();
        assert_eq!(json["IT"], 0.5);
        assert_eq!(json["Unknown"], 0.5);
    }
}
