//! Sector analytics.
//!
//! Classifies tickers into sectors, aggregates portfolio sector exposure and
//! ranks sectors by the performance of their proxy instruments.

mod classifier;
mod ranking;
mod source;

pub use classifier::{
    SectorCache, SectorClassifier, SectorExposure, SectorLabel, SectorMap, SectorSource,
};
pub use ranking::{rank_sectors, SectorPerformance, SectorRanking};
pub use source::StaticSectorSource;
