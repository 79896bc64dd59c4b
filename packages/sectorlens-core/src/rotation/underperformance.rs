//! Underperforming holding detection.

use crate::types::Metric;
use serde::{Deserialize, Serialize};

/// Default fraction of the portfolio CAGR a holding must reach.
pub const DEFAULT_UNDERPERFORMANCE_RATIO: f64 = 0.3;

/// A holding whose CAGR fell below the underperformance threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Underperformer {
    pub ticker: String,
    pub cagr: f64,
}

/// Flag tickers whose CAGR is below `threshold_ratio * portfolio_cagr`.
///
/// The comparison is sign-sensitive and applied literally: with a negative
/// portfolio CAGR the threshold is a less negative bound, so holdings that
/// lost less than the portfolio can still be flagged. Undefined ticker CAGRs
/// are never flagged and an undefined portfolio CAGR flags nothing. Input
/// order is preserved.
pub fn find_underperformers<S: AsRef<str>>(
    ticker_cagrs: &[(S, Metric)],
    portfolio_cagr: Metric,
    threshold_ratio: f64,
) -> Vec<Underperformer> {
    let Some(portfolio_cagr) = portfolio_cagr.value() else {
        return Vec::new();
    };
    let threshold = threshold_ratio * portfolio_cagr;

    ticker_cagrs
        .iter()
        .filter_map(|(ticker, cagr)| match cagr.value() {
            Some(value) if value < threshold => Some(Underperformer {
                ticker: ticker.as_ref().to_string(),
                cagr: value,
            }),
            _ => None,
        })
        .collect()
}
