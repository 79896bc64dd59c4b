//! Core data types for the SectorLens analytics engine.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Raw weights further than this from 1.0 are reported before normalizing.
const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// A single daily closing price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price (always positive)
    pub price: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Daily closing prices for one instrument, with strictly increasing dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting non-positive prices and unordered dates.
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        for point in &points {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "price on {} must be positive, got {}",
                    point.date, point.price
                )));
            }
        }

        if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(Error::InvalidInput(format!(
                "price dates must be strictly increasing ({} then {})",
                pair[0].date, pair[1].date
            )));
        }

        Ok(Self { points })
    }

    /// Build a series from `(date, price)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, price)| PricePoint::new(date, price))
                .collect(),
        )
    }

    /// Build a series of consecutive calendar days starting at `start`.
    pub fn daily(start: NaiveDate, prices: &[f64]) -> Result<Self> {
        Self::from_pairs(
            start
                .iter_days()
                .zip(prices.iter().copied())
                .collect::<Vec<_>>(),
        )
    }

    /// Observations in date order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the series has no observation.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest observation.
    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    /// Latest observation.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Dates of every observation, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Calendar days between the first and last observation.
    pub fn span_days(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }

    /// Keep only the observations falling on `dates`.
    pub fn restricted_to(&self, dates: &BTreeSet<NaiveDate>) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| dates.contains(&p.date))
                .copied()
                .collect(),
        }
    }

    /// Keep only the observations inside `range`.
    pub fn within(&self, range: &DateRange) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| range.contains(p.date))
                .copied()
                .collect(),
        }
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = Error;

    fn try_from(points: Vec<PricePoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

/// Daily simple returns derived from a [`PriceSeries`].
///
/// Each return is dated by the later of its two prices. The base date is the
/// date of the first price, so the calendar span survives the conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnSeries {
    base_date: NaiveDate,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Build a return series; dates must be strictly increasing and after `base_date`.
    pub fn new(base_date: NaiveDate, points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        let mut previous = base_date;
        for (date, _) in &points {
            if *date <= previous {
                return Err(Error::InvalidInput(format!(
                    "return dates must be strictly increasing ({} then {})",
                    previous, date
                )));
            }
            previous = *date;
        }

        let (dates, values) = points.into_iter().unzip();
        Ok(Self {
            base_date,
            dates,
            values,
        })
    }

    /// Date of the price the first return is measured from.
    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }

    /// Date of each return.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return values, aligned with [`ReturnSeries::dates`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of returns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the series has no return.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Calendar days from the base date to the last return.
    pub fn span_days(&self) -> i64 {
        self.dates
            .last()
            .map(|last| (*last - self.base_date).num_days())
            .unwrap_or(0)
    }

    /// Iterate `(date, return)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// Inclusive date range for an analysis run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "date range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// True when `date` falls inside the range, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A numeric result that may be undefined.
///
/// `Defined(0.0)` is a computed zero; `Undefined` marks a value that could not
/// be computed (zero span, zero volatility, zero market variance, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum Metric {
    Defined(f64),
    #[default]
    Undefined,
}

impl Metric {
    /// Wrap a float, treating NaN and infinities as undefined.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Metric::Defined(value)
        } else {
            Metric::Undefined
        }
    }

    /// The value when defined.
    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(*v),
            Metric::Undefined => None,
        }
    }

    /// True for [`Metric::Defined`].
    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    /// True for [`Metric::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, Metric::Undefined)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Defined(v) => write!(f, "{:.6}", v),
            Metric::Undefined => f.write_str("undefined"),
        }
    }
}

/// One holding of a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Portfolio weight (normalized once inside a [`Portfolio`])
    pub weight: f64,
}

impl Holding {
    /// Create a new holding with the given ticker and raw weight.
    pub fn new(ticker: &str, weight: f64) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            weight,
        }
    }
}

/// A set of weighted holdings whose weights always sum to 1.0.
///
/// Duplicate tickers are merged by summing their weights; the merged holding
/// keeps the position of its first occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<Holding>", into = "Vec<Holding>")]
pub struct Portfolio {
    holdings: Vec<Holding>,
}

impl Portfolio {
    /// Create a portfolio from `(ticker, weight)` pairs.
    pub fn new<I, S>(holdings: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        Self::from_holdings(
            holdings
                .into_iter()
                .map(|(ticker, weight)| Holding::new(ticker.as_ref(), weight))
                .collect(),
        )
    }

    /// Validate, merge and normalize a list of holdings.
    pub fn from_holdings(raw: Vec<Holding>) -> Result<Self> {
        let mut holdings: Vec<Holding> = Vec::with_capacity(raw.len());

        for holding in raw {
            let holding = Holding::new(&holding.ticker, holding.weight);
            if holding.ticker.is_empty() {
                return Err(Error::InvalidInput("ticker must not be empty".to_string()));
            }
            if !holding.weight.is_finite() || holding.weight < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "weight for {} must be a non-negative number, got {}",
                    holding.ticker, holding.weight
                )));
            }

            match holdings.iter_mut().find(|h| h.ticker == holding.ticker) {
                Some(existing) => {
                    tracing::warn!(ticker = %holding.ticker, "duplicate ticker, merging weights");
                    existing.weight += holding.weight;
                }
                None => holdings.push(holding),
            }
        }

        if holdings.is_empty() {
            return Err(Error::InvalidInput(
                "portfolio must contain at least one holding".to_string(),
            ));
        }

        let total: f64 = holdings.iter().map(|h| h.weight).sum();
        if total <= 0.0 {
            return Err(Error::InvalidInput(
                "portfolio weights must sum to a positive value".to_string(),
            ));
        }
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            tracing::warn!(total, "portfolio weights do not sum to 1.0, normalizing");
        }

        for holding in &mut holdings {
            holding.weight /= total;
        }

        Ok(Self { holdings })
    }

    /// Holdings in portfolio order.
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// Tickers in portfolio order.
    pub fn tickers(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }

    /// Normalized weight of a ticker (case-insensitive).
    pub fn weight_of(&self, ticker: &str) -> Option<f64> {
        let ticker = ticker.trim().to_uppercase();
        self.holdings
            .iter()
            .find(|h| h.ticker == ticker)
            .map(|h| h.weight)
    }

    /// Weights keyed by ticker.
    pub fn weights(&self) -> BTreeMap<String, f64> {
        self.holdings
            .iter()
            .map(|h| (h.ticker.clone(), h.weight))
            .collect()
    }

    /// Number of holdings.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// True when the portfolio has no holding.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Keep the holdings accepted by `keep`, renormalizing their weights.
    ///
    /// Fails with [`Error::DataUnavailable`] when nothing is kept or the kept
    /// holdings carry no weight.
    pub fn restricted_to<F>(&self, keep: F) -> Result<Self>
    where
        F: Fn(&str) -> bool,
    {
        let mut kept: Vec<Holding> = self
            .holdings
            .iter()
            .filter(|h| keep(&h.ticker))
            .cloned()
            .collect();

        if kept.is_empty() {
            return Err(Error::DataUnavailable(
                "no holdings remain after filtering".to_string(),
            ));
        }

        let total: f64 = kept.iter().map(|h| h.weight).sum();
        if total <= 0.0 {
            return Err(Error::DataUnavailable(format!(
                "remaining holdings ({}) carry no weight",
                kept.iter().map(|h| h.ticker.as_str()).collect::<Vec<_>>().join(", ")
            )));
        }

        for holding in &mut kept {
            holding.weight /= total;
        }
        tracing::debug!(
            kept = kept.len(),
            dropped = self.holdings.len() - kept.len(),
            "renormalized weights over remaining holdings"
        );

        Ok(Self { holdings: kept })
    }
}

impl TryFrom<Vec<Holding>> for Portfolio {
    type Error = Error;

    fn try_from(holdings: Vec<Holding>) -> Result<Self> {
        Self::from_holdings(holdings)
    }
}

impl From<Portfolio> for Vec<Holding> {
    fn from(portfolio: Portfolio) -> Self {
        portfolio.holdings
    }
}

/// Performance and risk metrics for a portfolio or a single instrument.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PerformanceMetrics {
    /// Compound annual growth rate
    pub cagr: Metric,
    /// Annualized volatility (sample standard deviation × √252)
    pub volatility: Metric,
    /// CAGR divided by volatility
    pub sharpe: Metric,
    /// 5th percentile of daily returns
    pub var_95: Metric,
    /// Sensitivity to the benchmark's daily returns
    pub beta: Metric,
}

/// JSON envelope used by the command line interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
