//! Sector performance ranking from sector-proxy price series.

use crate::returns::cagr;
use crate::types::{Metric, PriceSeries};
use serde::{Deserialize, Serialize};

/// CAGR of one sector proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorPerformance {
    pub sector: String,
    pub cagr: f64,
}

/// Sectors ordered by CAGR, plus the sectors whose CAGR could not be computed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SectorRanking {
    /// Sorted by CAGR descending, ties by sector label ascending
    pub ranked: Vec<SectorPerformance>,
    /// Sectors with missing or insufficient proxy data, sorted by label
    pub undefined: Vec<String>,
}

impl SectorRanking {
    /// The first `n` ranked sectors.
    pub fn top_sectors(&self, n: usize) -> &[SectorPerformance] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// CAGR of a sector, undefined when it was not ranked.
    pub fn cagr_of(&self, sector: &str) -> Metric {
        self.ranked
            .iter()
            .find(|p| p.sector == sector)
            .map(|p| Metric::Defined(p.cagr))
            .unwrap_or(Metric::Undefined)
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Rank sectors by the CAGR of their proxy series.
///
/// A sector whose proxy is missing (`None`) or has an undefined CAGR is
/// excluded from the ranking and listed in [`SectorRanking::undefined`].
pub fn rank_sectors<'a, I, S>(proxies: I) -> SectorRanking
where
    I: IntoIterator<Item = (S, Option<&'a PriceSeries>)>,
    S: Into<String>,
{
    let mut ranking = SectorRanking::default();

    for (sector, series) in proxies {
        let sector = sector.into();
        match series.map(cagr).and_then(|m| m.value()) {
            Some(value) => ranking.ranked.push(SectorPerformance {
                sector,
                cagr: value,
            }),
            None => {
                tracing::debug!(sector = %sector, "sector proxy CAGR undefined");
                ranking.undefined.push(sector);
            }
        }
    }

    ranking.ranked.sort_by(|a, b| {
        b.cagr
            .total_cmp(&a.cagr)
            .then_with(|| a.sector.cmp(&b.sector))
    });
    ranking.undefined.sort();

    ranking
}
