//! Static sector metadata source.

use super::classifier::SectorSource;
use crate::config::AnalyzerConfig;
use crate::Result;
use std::collections::HashMap;

/// Sector metadata from a fixed ticker to sector table.
#[derive(Debug, Clone, Default)]
pub struct StaticSectorSource {
    sectors: HashMap<String, String>,
}

impl StaticSectorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source backed by the config's `ticker_sectors` table.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        config
            .ticker_sectors
            .iter()
            .map(|(ticker, sector)| (ticker.as_str(), sector.as_str()))
            .collect()
    }

    pub fn insert(&mut self, ticker: &str, sector: &str) {
        self.sectors
            .insert(ticker.trim().to_uppercase(), sector.to_string());
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for StaticSectorSource {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (ticker, sector) in iter {
            source.insert(ticker, sector);
        }
        source
    }
}

impl SectorSource for StaticSectorSource {
    fn fetch_sector(&self, ticker: &str) -> Result<Option<String>> {
        Ok(self.sectors.get(&ticker.trim().to_uppercase()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = AnalyzerConfig::default();
        config
            .ticker_sectors
            .insert("tcs.ns".to_string(), "IT".to_string());

        let source = StaticSectorSource::from_config(&config);
        assert_eq!(source.fetch_sector("TCS.NS").unwrap(), Some("IT".to_string()));
        assert_eq!(source.fetch_sector("INFY.NS").unwrap(), None);
    }
}
