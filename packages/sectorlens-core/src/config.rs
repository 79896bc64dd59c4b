//! Analyzer configuration loaded from TOML.

use crate::rotation::DEFAULT_UNDERPERFORMANCE_RATIO;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of top-ranked sectors considered for replacements.
pub const DEFAULT_TOP_SECTORS: usize = 3;

/// Default sector concentration cap for replacement sectors.
pub const DEFAULT_CONCENTRATION_CAP: f64 = 0.30;

/// Default benchmark ticker for beta.
pub const DEFAULT_BENCHMARK: &str = "SPY";

/// Sector label to representative instrument (usually a sector ETF).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SectorRegistry {
    instruments: BTreeMap<String, String>,
}

impl SectorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// NSE sector indices used as sector proxies for Indian portfolios.
    pub fn indian_sector_etfs() -> Self {
        [
            ("Banking", "NSEBANK.NS"),
            ("IT", "NSEIT.NS"),
            ("Pharma", "NSEPHARMA.NS"),
            ("Energy", "NSEOIL.NS"),
            ("FMCG", "NSEFMCG.NS"),
            ("Infrastructure", "NSEINFRA.NS"),
            ("Auto", "NSEAUTO.NS"),
            ("Metal", "NSEMETAL.NS"),
            ("Finance", "NSEFIN.NS"),
        ]
        .into_iter()
        .collect()
    }

    /// Register (or replace) the instrument for a sector.
    pub fn insert(&mut self, sector: &str, instrument: &str) {
        self.instruments
            .insert(sector.to_string(), instrument.trim().to_uppercase());
    }

    /// Instrument registered for `sector`.
    pub fn instrument_for(&self, sector: &str) -> Option<&str> {
        self.instruments.get(sector).map(String::as_str)
    }

    /// `(sector, instrument)` pairs ordered by sector.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.instruments
            .iter()
            .map(|(sector, instrument)| (sector.as_str(), instrument.as_str()))
    }

    /// Number of registered sectors.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// True when no sector is registered.
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for SectorRegistry {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (sector, instrument) in iter {
            registry.insert(sector, instrument);
        }
        registry
    }
}

/// Tunable policy and static reference data for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Benchmark ticker for beta; empty disables beta
    pub benchmark: String,
    /// Holdings with CAGR below this fraction of the portfolio CAGR are flagged
    pub underperformance_ratio: f64,
    /// Number of top-ranked sectors considered for replacements
    pub top_sectors: usize,
    /// Replacement sectors must have exposure strictly below this weight
    pub concentration_cap: f64,
    /// Sector proxy registry (sector label to instrument)
    pub sector_instruments: SectorRegistry,
    /// Static sector metadata (ticker to sector label)
    pub ticker_sectors: BTreeMap<String, String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            benchmark: DEFAULT_BENCHMARK.to_string(),
            underperformance_ratio: DEFAULT_UNDERPERFORMANCE_RATIO,
            top_sectors: DEFAULT_TOP_SECTORS,
            concentration_cap: DEFAULT_CONCENTRATION_CAP,
            sector_instruments: SectorRegistry::indian_sector_etfs(),
            ticker_sectors: BTreeMap::new(),
        }
    }
}

impl AnalyzerConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.sectorlens/config.toml`
    /// Can be overridden with `SECTORLENS_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("SECTORLENS_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".sectorlens/config.toml"))
            .unwrap_or_else(|| PathBuf::from("sectorlens.toml"))
    }

    /// Load config from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load config from a specific path; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside their meaningful domain.
    pub fn validate(&self) -> Result<()> {
        if !self.underperformance_ratio.is_finite() || self.underperformance_ratio < 0.0 {
            return Err(Error::InvalidInput(format!(
                "underperformance_ratio must be a non-negative number, got {}",
                self.underperformance_ratio
            )));
        }

        if !(self.concentration_cap > 0.0 && self.concentration_cap <= 1.0) {
            return Err(Error::InvalidInput(format!(
                "concentration_cap must be in (0, 1], got {}",
                self.concentration_cap
            )));
        }

        if self.top_sectors == 0 {
            return Err(Error::InvalidInput(
                "top_sectors must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Benchmark ticker, if beta is enabled.
    pub fn benchmark(&self) -> Option<String> {
        let benchmark = self.benchmark.trim();
        if benchmark.is_empty() {
            None
        } else {
            Some(benchmark.to_uppercase())
        }
    }
}
