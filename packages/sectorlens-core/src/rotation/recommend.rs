//! Sector-rotation replacement recommendations.

use super::underperformance::Underperformer;
use crate::config::{AnalyzerConfig, SectorRegistry, DEFAULT_CONCENTRATION_CAP, DEFAULT_TOP_SECTORS};
use crate::sector::{
    SectorCache, SectorClassifier, SectorExposure, SectorLabel, SectorRanking, SectorSource,
};
use serde::{Deserialize, Serialize};

/// Suggested replacement for one underperforming holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    /// The underperforming ticker
    pub ticker: String,
    /// Sector to rotate into, `None` when no sector could be ranked
    pub sector: Option<String>,
    /// Representative instrument of that sector, `None` when not registered
    pub instrument: Option<String>,
}

/// Picks replacement sectors from the top of the sector ranking.
#[derive(Debug, Clone)]
pub struct ReplacementRecommender<'a> {
    registry: &'a SectorRegistry,
    top_n: usize,
    concentration_cap: f64,
}

impl<'a> ReplacementRecommender<'a> {
    /// Recommender with the default top-3 window and 30% concentration cap.
    pub fn new(registry: &'a SectorRegistry) -> Self {
        Self {
            registry,
            top_n: DEFAULT_TOP_SECTORS,
            concentration_cap: DEFAULT_CONCENTRATION_CAP,
        }
    }

    pub fn from_config(config: &'a AnalyzerConfig) -> Self {
        Self::new(&config.sector_instruments)
            .with_top_n(config.top_sectors)
            .with_concentration_cap(config.concentration_cap)
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_concentration_cap(mut self, cap: f64) -> Self {
        self.concentration_cap = cap;
        self
    }

    /// Choose a replacement sector for a holding in `own_sector`.
    ///
    /// Takes the first top-N sector that differs from `own_sector` and whose
    /// exposure is strictly below the cap. Falls back to the best-ranked
    /// sector when none qualifies; `None` only when nothing is ranked.
    pub fn choose_sector<'r>(
        &self,
        own_sector: &SectorLabel,
        ranking: &'r SectorRanking,
        exposure: &SectorExposure,
    ) -> Option<&'r str> {
        let top = ranking.top_sectors(self.top_n);

        top.iter()
            .find(|p| {
                !own_sector.is(&p.sector) && exposure.weight_of(&p.sector) < self.concentration_cap
            })
            .or_else(|| top.first())
            .map(|p| p.sector.as_str())
    }

    /// One recommendation per underperformer, in input order.
    ///
    /// Holdings are handled independently, so two underperformers may be
    /// pointed at the same instrument.
    pub fn recommend<S: SectorSource>(
        &self,
        underperformers: &[Underperformer],
        ranking: &SectorRanking,
        exposure: &SectorExposure,
        classifier: &SectorClassifier<S>,
        cache: &mut SectorCache,
    ) -> Vec<Recommendation> {
        underperformers
            .iter()
            .map(|under| {
                let own_sector = classifier.sector_of(&under.ticker, cache);
                let sector = self.choose_sector(&own_sector, ranking, exposure);
                let instrument = sector
                    .and_then(|s| self.registry.instrument_for(s))
                    .map(str::to_string);

                if sector.is_some() && instrument.is_none() {
                    tracing::debug!(ticker = %under.ticker, sector = ?sector, "no instrument registered for sector");
                }

                Recommendation {
                    ticker: under.ticker.clone(),
                    sector: sector.map(str::to_string),
                    instrument,
                }
            })
            .collect()
    }
}
