//! Risk metrics over daily return series.
//!
//! Provides volatility, Sharpe ratio, historical VaR, beta and return
//! correlations. Every metric reports [`Metric::Undefined`] instead of
//! dividing by zero.

use super::performance::cagr_from_returns;
use crate::types::{Metric, PerformanceMetrics, ReturnSeries};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Percentile used for the 95% value at risk.
const VAR_95_QUANTILE: f64 = 0.05;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample covariance (n − 1 denominator); `None` with fewer than 2 points.
fn sample_covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }

    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a), mean(b));
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();

    Some(sum / (n - 1) as f64)
}

fn sample_variance(values: &[f64]) -> Option<f64> {
    sample_covariance(values, values)
}

/// Annualized volatility: sample standard deviation × √252.
///
/// Undefined with fewer than 2 returns. A constant series gives `Defined(0.0)`.
pub fn volatility(returns: &[f64]) -> Metric {
    match sample_variance(returns) {
        Some(variance) => Metric::from_f64(variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()),
        None => Metric::Undefined,
    }
}

/// Risk-adjusted return: CAGR divided by annualized volatility.
///
/// Undefined when volatility is zero or either input is undefined.
pub fn sharpe(cagr: Metric, volatility: Metric) -> Metric {
    match (cagr, volatility) {
        (Metric::Defined(c), Metric::Defined(v)) if v != 0.0 => Metric::from_f64(c / v),
        _ => Metric::Undefined,
    }
}

/// Percentile `q` (0.0 to 1.0) with linear interpolation between order statistics.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Historical value at risk at 95%: the 5th percentile of daily returns.
///
/// The result is a return (typically negative), not a currency amount.
pub fn value_at_risk_95(returns: &[f64]) -> Metric {
    percentile(returns, VAR_95_QUANTILE)
        .map(Metric::from_f64)
        .unwrap_or(Metric::Undefined)
}

/// Sensitivity of portfolio returns to market returns.
///
/// Both series must share the same dates. Undefined when the market has zero
/// variance or fewer than 2 observations exist.
pub fn beta(portfolio: &ReturnSeries, market: &ReturnSeries) -> Result<Metric> {
    if portfolio.is_empty() || market.is_empty() {
        return Err(Error::Alignment(
            "beta requires non-empty return series".to_string(),
        ));
    }
    if portfolio.dates() != market.dates() {
        return Err(Error::Alignment(format!(
            "beta requires matching dates ({} vs {} observations)",
            portfolio.len(),
            market.len()
        )));
    }

    let covariance = sample_covariance(portfolio.values(), market.values());
    let variance = sample_variance(market.values());

    Ok(match (covariance, variance) {
        (Some(cov), Some(var)) if var > 0.0 => Metric::from_f64(cov / var),
        _ => Metric::Undefined,
    })
}

/// Full metric set for one return series.
///
/// Beta is computed only when `market` is given.
pub fn performance_metrics(
    returns: &ReturnSeries,
    market: Option<&ReturnSeries>,
) -> Result<PerformanceMetrics> {
    let cagr = cagr_from_returns(returns);
    let volatility = volatility(returns.values());

    Ok(PerformanceMetrics {
        cagr,
        volatility,
        sharpe: sharpe(cagr, volatility),
        var_95: value_at_risk_95(returns.values()),
        beta: match market {
            Some(market) => beta(returns, market)?,
            None => Metric::Undefined,
        },
    })
}

/// Pairwise Pearson correlations of daily returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationMatrix {
    /// Row and column labels
    pub tickers: Vec<String>,
    /// Correlation values, `values[i][j]` for `tickers[i]` and `tickers[j]`
    pub values: Vec<Vec<Metric>>,
}

impl CorrelationMatrix {
    /// Correlation between two tickers, if both are present.
    pub fn get(&self, a: &str, b: &str) -> Option<Metric> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        Some(self.values[i][j])
    }
}

/// Correlation matrix of aligned return series.
///
/// Pairs involving a zero-variance series are undefined.
pub fn correlation_matrix(
    returns_by_ticker: &BTreeMap<String, ReturnSeries>,
) -> Result<CorrelationMatrix> {
    let series: Vec<(&String, &ReturnSeries)> = returns_by_ticker.iter().collect();

    if let Some((first_ticker, first)) = series.first() {
        for (ticker, s) in &series[1..] {
            if s.dates() != first.dates() {
                return Err(Error::Alignment(format!(
                    "return dates of {} do not match {}",
                    ticker, first_ticker
                )));
            }
        }
    }

    let values = series
        .iter()
        .map(|(_, a)| {
            series
                .iter()
                .map(|(_, b)| pearson(a.values(), b.values()))
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix {
        tickers: series.iter().map(|(t, _)| (*t).clone()).collect(),
        values,
    })
}

fn pearson(a: &[f64], b: &[f64]) -> Metric {
    match (
        sample_covariance(a, b),
        sample_variance(a),
        sample_variance(b),
    ) {
        (Some(cov), Some(var_a), Some(var_b)) if var_a > 0.0 && var_b > 0.0 => {
            Metric::from_f64(cov / (var_a.sqrt() * var_b.sqrt()))
        }
        _ => Metric::Undefined,
    }
}
