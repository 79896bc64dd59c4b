//! Return series construction, alignment and growth analytics.

use crate::types::{Metric, PriceSeries, ReturnSeries};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Calendar days per year used to annualize growth over a calendar span.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// A dated portfolio value (growth of one unit invested).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Price series restricted to the dates every ticker has in common.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedPrices {
    /// Common date index, ascending
    pub dates: Vec<NaiveDate>,
    /// Series per ticker, each covering exactly `dates`
    pub series: BTreeMap<String, PriceSeries>,
}

impl AlignedPrices {
    /// Daily returns for every ticker, keyed by ticker.
    pub fn daily_returns(&self) -> Result<BTreeMap<String, ReturnSeries>> {
        self.series
            .iter()
            .map(|(ticker, series)| Ok((ticker.clone(), daily_returns(series)?)))
            .collect()
    }
}

/// Convert a price series into daily simple returns.
///
/// Fails with [`Error::InsufficientData`] when fewer than 2 prices exist.
pub fn daily_returns(series: &PriceSeries) -> Result<ReturnSeries> {
    let points = series.points();
    if points.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "need at least 2 prices for daily returns, got {}",
            points.len()
        )));
    }

    let returns = points
        .windows(2)
        .map(|w| (w[1].date, w[1].price / w[0].price - 1.0))
        .collect();

    ReturnSeries::new(points[0].date, returns)
}

/// Compound annual growth rate of a price series over its calendar span.
///
/// Undefined for fewer than 2 prices or a zero-day span.
pub fn cagr(series: &PriceSeries) -> Metric {
    match daily_returns(series) {
        Ok(returns) => cagr_from_returns(&returns),
        Err(_) => Metric::Undefined,
    }
}

/// Compound annual growth rate of a return series.
///
/// The growth factor is the product of `(1 + r)`; the span runs from the
/// series' base date to its last return.
pub fn cagr_from_returns(returns: &ReturnSeries) -> Metric {
    if returns.is_empty() {
        return Metric::Undefined;
    }

    let factor: f64 = returns.values().iter().map(|r| 1.0 + r).product();
    annualize_growth(factor, returns.span_days())
}

/// Annualize a cumulative growth factor observed over `span_days` calendar days.
pub fn annualize_growth(factor: f64, span_days: i64) -> Metric {
    if span_days <= 0 || !factor.is_finite() || factor <= 0.0 {
        return Metric::Undefined;
    }

    Metric::from_f64(factor.powf(DAYS_PER_YEAR / span_days as f64) - 1.0)
}

/// Restrict every series to the dates present in all of them.
///
/// Fails with [`Error::Alignment`] when no series is given or the series
/// share no date.
pub fn align_prices(series_by_ticker: &BTreeMap<String, PriceSeries>) -> Result<AlignedPrices> {
    let mut iter = series_by_ticker.values();
    let first = iter
        .next()
        .ok_or_else(|| Error::Alignment("no price series to align".to_string()))?;

    let mut common: BTreeSet<NaiveDate> = first.dates().collect();
    for series in iter {
        let dates: BTreeSet<NaiveDate> = series.dates().collect();
        common = common.intersection(&dates).copied().collect();
    }

    if common.is_empty() {
        return Err(Error::Alignment(format!(
            "no overlapping dates across {} series",
            series_by_ticker.len()
        )));
    }

    let series = series_by_ticker
        .iter()
        .map(|(ticker, s)| (ticker.clone(), s.restricted_to(&common)))
        .collect();

    Ok(AlignedPrices {
        dates: common.into_iter().collect(),
        series,
    })
}

/// Weighted sum of per-ticker daily returns.
///
/// Series are matched by ticker, never by position. Every series must share
/// one date index and every ticker must carry a weight.
pub fn portfolio_daily_returns(
    returns_by_ticker: &BTreeMap<String, ReturnSeries>,
    weights: &BTreeMap<String, f64>,
) -> Result<ReturnSeries> {
    let mut iter = returns_by_ticker.iter();
    let (first_ticker, first) = iter
        .next()
        .ok_or_else(|| Error::Alignment("no return series to combine".to_string()))?;

    for (ticker, series) in iter {
        if series.dates() != first.dates() || series.base_date() != first.base_date() {
            return Err(Error::Alignment(format!(
                "return dates of {} do not match {}",
                ticker, first_ticker
            )));
        }
    }

    let mut combined = vec![0.0; first.len()];
    for (ticker, series) in returns_by_ticker {
        let weight = weights
            .get(ticker)
            .ok_or_else(|| Error::Alignment(format!("no weight for {}", ticker)))?;
        for (total, r) in combined.iter_mut().zip(series.values()) {
            *total += weight * r;
        }
    }

    ReturnSeries::new(
        first.base_date(),
        first.dates().iter().copied().zip(combined).collect(),
    )
}

/// Growth of one unit compounded through a return series.
///
/// The first point is the base date at 1.0.
pub fn cumulative_growth(returns: &ReturnSeries) -> Vec<ValuePoint> {
    let mut growth = Vec::with_capacity(returns.len() + 1);
    growth.push(ValuePoint {
        date: returns.base_date(),
        value: 1.0,
    });

    let mut value = 1.0;
    for (date, r) in returns.iter() {
        value *= 1.0 + r;
        growth.push(ValuePoint { date, value });
    }

    growth
}

/// Weighted sum of prices normalized to their first common observation.
pub fn normalized_portfolio_value(
    aligned: &AlignedPrices,
    weights: &BTreeMap<String, f64>,
) -> Result<Vec<ValuePoint>> {
    let mut values = vec![0.0; aligned.dates.len()];

    for (ticker, series) in &aligned.series {
        let weight = weights
            .get(ticker)
            .ok_or_else(|| Error::Alignment(format!("no weight for {}", ticker)))?;
        let base = series
            .first()
            .ok_or_else(|| Error::InsufficientData(format!("no prices for {}", ticker)))?
            .price;
        for (total, point) in values.iter_mut().zip(series.points()) {
            *total += weight * point.price / base;
        }
    }

    Ok(aligned
        .dates
        .iter()
        .copied()
        .zip(values)
        .map(|(date, value)| ValuePoint { date, value })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn series(prices: &[f64]) -> PriceSeries {
        PriceSeries::daily(day(1), prices).unwrap()
    }

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&series(&[100.0, 110.0, 99.0])).unwrap();

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.base_date(), day(1));
        assert_eq!(returns.dates(), &[day(2), day(3)]);
        assert_abs_diff_eq!(returns.values()[0], 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(returns.values()[1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_daily_returns_single_price_is_insufficient() {
        let result = daily_returns(&series(&[100.0]));
        assert!(matches!(result, Err(Error::InsufficientData(_))));

        let result = daily_returns(&series(&[]));
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_cagr_one_year_doubling() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let prices = PriceSeries::from_pairs(vec![(start, 100.0), (end, 200.0)]).unwrap();

        // 365 days rather than 365.25, so slightly above 100%
        let expected = 2.0_f64.powf(365.25 / 365.0) - 1.0;
        assert_abs_diff_eq!(cagr(&prices).value().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_cagr_constant_prices_is_zero_not_undefined() {
        let value = cagr(&series(&[50.0, 50.0, 50.0, 50.0]));
        assert_eq!(value, Metric::Defined(0.0));
    }

    #[test]
    fn test_cagr_undefined_cases() {
        assert!(cagr(&series(&[100.0])).is_undefined());
        assert!(annualize_growth(1.1, 0).is_undefined());
        assert!(annualize_growth(0.0, 10).is_undefined());
        assert!(annualize_growth(-0.5, 10).is_undefined());
    }

    #[test]
    fn test_cagr_from_returns_matches_price_cagr() {
        let prices = series(&[100.0, 103.0, 101.0, 108.0, 111.0]);
        let returns = daily_returns(&prices).unwrap();

        assert_abs_diff_eq!(
            cagr_from_returns(&returns).value().unwrap(),
            cagr(&prices).value().unwrap(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_align_prices_intersects_dates() {
        let a = PriceSeries::from_pairs(vec![(day(1), 10.0), (day(2), 11.0), (day(3), 12.0)])
            .unwrap();
        let b = PriceSeries::from_pairs(vec![(day(2), 20.0), (day(3), 21.0), (day(4), 22.0)])
            .unwrap();

        let mut input = BTreeMap::new();
        input.insert("A".to_string(), a);
        input.insert("B".to_string(), b);

        let aligned = align_prices(&input).unwrap();
        assert_eq!(aligned.dates, vec![day(2), day(3)]);
        assert_eq!(aligned.series["A"].first().unwrap().price, 11.0);
        assert_eq!(aligned.series["B"].last().unwrap().price, 21.0);
    }

    #[test]
    fn test_align_prices_without_overlap_fails() {
        let a = PriceSeries::from_pairs(vec![(day(1), 10.0), (day(2), 11.0)]).unwrap();
        let b = PriceSeries::from_pairs(vec![(day(3), 20.0), (day(4), 21.0)]).unwrap();

        let mut input = BTreeMap::new();
        input.insert("A".to_string(), a);
        input.insert("B".to_string(), b);

        assert!(matches!(align_prices(&input), Err(Error::Alignment(_))));
        assert!(matches!(
            align_prices(&BTreeMap::new()),
            Err(Error::Alignment(_))
        ));
    }

    #[test]
    fn test_portfolio_daily_returns_two_tickers() {
        let mut returns = BTreeMap::new();
        returns.insert(
            "A".to_string(),
            daily_returns(&series(&[100.0, 110.0, 121.0])).unwrap(),
        );
        returns.insert(
            "B".to_string(),
            daily_returns(&series(&[100.0, 100.0, 100.0])).unwrap(),
        );

        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), 0.5);
        weights.insert("B".to_string(), 0.5);

        let combined = portfolio_daily_returns(&returns, &weights).unwrap();
        assert_eq!(combined.len(), 2);
        assert_abs_diff_eq!(combined.values()[0], 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(combined.values()[1], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_daily_returns_keyed_by_ticker() {
        // Weights listed in a different order than the series must still pair by key
        let mut returns = BTreeMap::new();
        returns.insert("A".to_string(), daily_returns(&series(&[100.0, 110.0])).unwrap());
        returns.insert("B".to_string(), daily_returns(&series(&[100.0, 90.0])).unwrap());

        let weights: BTreeMap<String, f64> =
            vec![("B".to_string(), 0.75), ("A".to_string(), 0.25)]
                .into_iter()
                .collect();

        let combined = portfolio_daily_returns(&returns, &weights).unwrap();
        assert_abs_diff_eq!(combined.values()[0], 0.25 * 0.10 - 0.75 * 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_daily_returns_rejects_misaligned_series() {
        let mut returns = BTreeMap::new();
        returns.insert("A".to_string(), daily_returns(&series(&[1.0, 2.0, 3.0])).unwrap());
        returns.insert("B".to_string(), daily_returns(&series(&[1.0, 2.0])).unwrap());

        let weights: BTreeMap<String, f64> =
            vec![("A".to_string(), 0.5), ("B".to_string(), 0.5)]
                .into_iter()
                .collect();

        assert!(matches!(
            portfolio_daily_returns(&returns, &weights),
            Err(Error::Alignment(_))
        ));
    }

    #[test]
    fn test_portfolio_daily_returns_requires_weight() {
        let mut returns = BTreeMap::new();
        returns.insert("A".to_string(), daily_returns(&series(&[1.0, 2.0])).unwrap());

        assert!(matches!(
            portfolio_daily_returns(&returns, &BTreeMap::new()),
            Err(Error::Alignment(_))
        ));
    }

    #[test]
    fn test_cumulative_growth() {
        let returns = daily_returns(&series(&[100.0, 110.0, 121.0])).unwrap();
        let growth = cumulative_growth(&returns);

        assert_eq!(growth.len(), 3);
        assert_eq!(growth[0].value, 1.0);
        assert_abs_diff_eq!(growth[2].value, 1.21, epsilon = 1e-12);
        assert_eq!(growth[2].date, day(3));
    }

    #[test]
    fn test_normalized_portfolio_value() {
        let mut input = BTreeMap::new();
        input.insert("A".to_string(), series(&[100.0, 120.0]));
        input.insert("B".to_string(), series(&[50.0, 40.0]));
        let aligned = align_prices(&input).unwrap();

        let weights: BTreeMap<String, f64> =
            vec![("A".to_string(), 0.5), ("B".to_string(), 0.5)]
                .into_iter()
                .collect();

        let values = normalized_portfolio_value(&aligned, &weights).unwrap();
        assert_abs_diff_eq!(values[0].value, 1.0, epsilon = 1e-12);
        // 0.5 * 1.2 + 0.5 * 0.8
        assert_abs_diff_eq!(values[1].value, 1.0, epsilon = 1e-12);
    }
}
