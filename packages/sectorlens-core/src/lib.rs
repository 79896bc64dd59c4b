//! SectorLens Core - portfolio performance, risk and sector-rotation analytics.
//!
//! This crate provides the analytics engine behind the SectorLens dashboard:
//!
//! - **Return metrics**: daily returns, CAGR, volatility, Sharpe, VaR, beta
//! - **Sector analytics**: sector classification, exposure, proxy ranking
//! - **Rotation**: underperformer detection and replacement recommendations
//! - **Stress testing**: flat return shocks for named scenarios
//!
//! Market data and sector metadata come from collaborators implementing
//! [`PriceSeriesStore`] and [`SectorSource`].
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use sectorlens_core::{
//!     AnalyzerConfig, DateRange, InMemoryPriceStore, Portfolio, PortfolioAnalyzer,
//!     StaticSectorSource,
//! };
//!
//! let config = AnalyzerConfig::load().unwrap_or_default();
//! let store = InMemoryPriceStore::load_from_path("prices.json".as_ref()).unwrap();
//! let sectors = StaticSectorSource::from_config(&config);
//! let analyzer = PortfolioAnalyzer::new(store, sectors, config);
//!
//! let portfolio = Portfolio::new(vec![("RELIANCE.NS", 0.6), ("TCS.NS", 0.4)]).unwrap();
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
//! )
//! .unwrap();
//!
//! let analysis = analyzer.analyze_portfolio(&portfolio, &range).unwrap();
//! println!("Portfolio CAGR: {}", analysis.portfolio_metrics.cagr);
//! ```

pub mod analyzer;
pub mod config;
pub mod returns;
pub mod rotation;
pub mod sector;
pub mod store;
pub mod stress;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, DateRange, Holding, Metric, PerformanceMetrics, Portfolio, PricePoint,
    PriceSeries, ReturnSeries,
};

// Re-export main functionality
pub use analyzer::{PortfolioAnalysis, PortfolioAnalyzer, TickerMetrics};
pub use config::{AnalyzerConfig, SectorRegistry};
pub use returns::{
    align_prices, beta, cagr, correlation_matrix, daily_returns, percentile,
    portfolio_daily_returns, sharpe, value_at_risk_95, volatility,
};
pub use rotation::{find_underperformers, Recommendation, ReplacementRecommender, Underperformer};
pub use sector::{
    rank_sectors, SectorCache, SectorClassifier, SectorExposure, SectorLabel, SectorRanking,
    SectorSource, StaticSectorSource,
};
pub use store::{InMemoryPriceStore, PriceSeriesStore};
pub use stress::{apply_scenario, ScenarioKind, StressTestSummary};

/// Error types for sectorlens-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for sectorlens-core operations.
pub type Result<T> = std::result::Result<T, Error>;
