//! Portfolio analysis entry points.
//!
//! [`PortfolioAnalyzer`] wires the collaborators (price store, sector source)
//! to the return, sector and rotation analytics. Every call recomputes
//! everything from its inputs; only the caller's configuration is shared.

use crate::config::AnalyzerConfig;
use crate::returns::{
    align_prices, correlation_matrix, cumulative_growth, daily_returns, normalized_portfolio_value,
    performance_metrics, portfolio_daily_returns, AlignedPrices, CorrelationMatrix, ValuePoint,
};
use crate::rotation::{find_underperformers, Recommendation, ReplacementRecommender, Underperformer};
use crate::sector::{
    rank_sectors, SectorCache, SectorClassifier, SectorExposure, SectorLabel, SectorMap,
    SectorRanking, SectorSource,
};
use crate::store::PriceSeriesStore;
use crate::stress::{apply_scenario, ScenarioKind, StressTestSummary};
use crate::types::{DateRange, Metric, PerformanceMetrics, Portfolio, PriceSeries, ReturnSeries};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Metrics for one analyzed holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickerMetrics {
    pub ticker: String,
    /// Weight after dropping tickers without data
    pub weight: f64,
    pub sector: SectorLabel,
    pub metrics: PerformanceMetrics,
}

/// Full result of [`PortfolioAnalyzer::analyze_portfolio`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    /// Requested date range
    pub range: DateRange,
    /// Common trading dates actually analyzed
    pub trading_days: usize,
    pub portfolio_metrics: PerformanceMetrics,
    pub per_ticker_metrics: Vec<TickerMetrics>,
    pub sector_map: SectorMap,
    pub sector_exposure: SectorExposure,
    pub sector_ranking: SectorRanking,
    pub underperformers: Vec<Underperformer>,
    pub recommendations: Vec<Recommendation>,
    /// Weights renormalized over the tickers that had price data
    pub effective_weights: BTreeMap<String, f64>,
    /// Tickers dropped because no price data was available
    pub omitted_tickers: Vec<String>,
    /// Growth of one unit invested in the portfolio
    pub growth: Vec<ValuePoint>,
    /// Weighted sum of prices normalized to the first common date
    pub normalized_value: Vec<ValuePoint>,
    pub correlations: CorrelationMatrix,
}

/// Aligned inputs shared by analysis and stress testing.
struct PreparedReturns {
    effective: Portfolio,
    omitted: Vec<String>,
    aligned: AlignedPrices,
    returns_by_ticker: BTreeMap<String, ReturnSeries>,
    portfolio_returns: ReturnSeries,
}

/// Portfolio analytics over a price store and a sector source.
#[derive(Debug, Clone)]
pub struct PortfolioAnalyzer<P, S> {
    store: P,
    classifier: SectorClassifier<S>,
    config: AnalyzerConfig,
}

impl<P: PriceSeriesStore, S: SectorSource> PortfolioAnalyzer<P, S> {
    pub fn new(store: P, sectors: S, config: AnalyzerConfig) -> Self {
        Self {
            store,
            classifier: SectorClassifier::new(sectors),
            config,
        }
    }

    /// Compute metrics, sector views, underperformers and recommendations.
    ///
    /// Tickers without price data are dropped with a warning and the
    /// remaining weights renormalized; the call fails only when no ticker has
    /// data, the series share no date, or fewer than 2 common dates remain.
    pub fn analyze_portfolio(
        &self,
        portfolio: &Portfolio,
        range: &DateRange,
    ) -> Result<PortfolioAnalysis> {
        let mut cache = SectorCache::new();

        let sector_ranking = self.rank_sectors(range);
        let sector_map = self.classifier.sector_map(&portfolio.tickers(), &mut cache);
        let sector_exposure = SectorExposure::from_sector_map(portfolio, &sector_map);

        let prepared = self.prepare(portfolio, range)?;
        let market = self.benchmark_returns(&prepared.aligned, range);

        let portfolio_metrics = performance_metrics(&prepared.portfolio_returns, market.as_ref())?;

        let mut per_ticker_metrics = Vec::with_capacity(prepared.effective.len());
        for holding in prepared.effective.holdings() {
            let returns = prepared.returns_by_ticker.get(&holding.ticker).ok_or_else(|| {
                Error::Alignment(format!("no returns computed for {}", holding.ticker))
            })?;
            per_ticker_metrics.push(TickerMetrics {
                ticker: holding.ticker.clone(),
                weight: holding.weight,
                sector: self.classifier.sector_of(&holding.ticker, &mut cache),
                metrics: performance_metrics(returns, market.as_ref())?,
            });
        }

        let ticker_cagrs: Vec<(String, Metric)> = per_ticker_metrics
            .iter()
            .map(|t| (t.ticker.clone(), t.metrics.cagr))
            .collect();
        let underperformers = find_underperformers(
            &ticker_cagrs,
            portfolio_metrics.cagr,
            self.config.underperformance_ratio,
        );

        let recommendations = ReplacementRecommender::from_config(&self.config).recommend(
            &underperformers,
            &sector_ranking,
            &sector_exposure,
            &self.classifier,
            &mut cache,
        );

        tracing::debug!(
            tickers = per_ticker_metrics.len(),
            underperformers = underperformers.len(),
            "portfolio analysis complete"
        );

        let effective_weights = prepared.effective.weights();
        let normalized_value = normalized_portfolio_value(&prepared.aligned, &effective_weights)?;

        Ok(PortfolioAnalysis {
            range: *range,
            trading_days: prepared.aligned.dates.len(),
            portfolio_metrics,
            per_ticker_metrics,
            sector_map,
            sector_exposure,
            sector_ranking,
            underperformers,
            recommendations,
            effective_weights,
            omitted_tickers: prepared.omitted,
            growth: cumulative_growth(&prepared.portfolio_returns),
            normalized_value,
            correlations: correlation_matrix(&prepared.returns_by_ticker)?,
        })
    }

    /// Apply a scenario shock to the realized portfolio returns.
    pub fn run_stress_test(
        &self,
        portfolio: &Portfolio,
        range: &DateRange,
        scenario: ScenarioKind,
    ) -> Result<StressTestSummary> {
        let prepared = self.prepare(portfolio, range)?;
        apply_scenario(prepared.portfolio_returns.values(), scenario)
    }

    /// Weighted daily returns of the holdings that have price data.
    pub fn portfolio_returns(&self, portfolio: &Portfolio, range: &DateRange) -> Result<ReturnSeries> {
        Ok(self.prepare(portfolio, range)?.portfolio_returns)
    }

    /// Rank the registered sectors by the CAGR of their proxy instruments.
    pub fn rank_sectors(&self, range: &DateRange) -> SectorRanking {
        let registry = &self.config.sector_instruments;
        let instruments: Vec<String> = registry.iter().map(|(_, i)| i.to_string()).collect();
        let fetched = self.store.fetch_price_series(&instruments, range);

        rank_sectors(
            registry
                .iter()
                .map(|(sector, instrument)| (sector, fetched.get(instrument))),
        )
    }

    fn prepare(&self, portfolio: &Portfolio, range: &DateRange) -> Result<PreparedReturns> {
        let tickers = portfolio.tickers();
        let fetched = self.store.fetch_price_series(&tickers, range);

        let omitted: Vec<String> = tickers
            .iter()
            .filter(|t| !fetched.contains_key(*t))
            .cloned()
            .collect();
        for ticker in &omitted {
            tracing::warn!(ticker = %ticker, "no price data, excluding from analysis");
        }
        if omitted.len() == tickers.len() {
            return Err(Error::DataUnavailable(format!(
                "no price data for any of {}",
                tickers.join(", ")
            )));
        }

        let effective = portfolio.restricted_to(|t| fetched.contains_key(t))?;
        let series: BTreeMap<String, PriceSeries> = fetched
            .into_iter()
            .filter(|(ticker, _)| effective.weight_of(ticker).is_some())
            .collect();

        let aligned = align_prices(&series)?;
        if aligned.dates.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "need at least 2 common dates, got {}",
                aligned.dates.len()
            )));
        }

        let returns_by_ticker = aligned.daily_returns()?;
        let portfolio_returns = portfolio_daily_returns(&returns_by_ticker, &effective.weights())?;

        Ok(PreparedReturns {
            effective,
            omitted,
            aligned,
            returns_by_ticker,
            portfolio_returns,
        })
    }

    /// Benchmark returns on the analyzed dates, if the benchmark covers all of them.
    fn benchmark_returns(&self, aligned: &AlignedPrices, range: &DateRange) -> Option<ReturnSeries> {
        let benchmark = self.config.benchmark()?;

        let series = match aligned.series.get(&benchmark) {
            Some(series) => series.clone(),
            None => {
                let mut fetched = self
                    .store
                    .fetch_price_series(std::slice::from_ref(&benchmark), range);
                match fetched.remove(&benchmark) {
                    Some(series) => series,
                    None => {
                        tracing::warn!(benchmark = %benchmark, "no benchmark data, beta undefined");
                        return None;
                    }
                }
            }
        };

        let dates: BTreeSet<_> = aligned.dates.iter().copied().collect();
        let restricted = series.restricted_to(&dates);
        if restricted.len() != aligned.dates.len() {
            tracing::warn!(
                benchmark = %benchmark,
                missing = aligned.dates.len() - restricted.len(),
                "benchmark does not cover every analyzed date, beta undefined"
            );
            return None;
        }

        daily_returns(&restricted).ok()
    }
}
