//! Scenario stress testing on realized portfolio returns.
//!
//! A scenario is a flat shock added to every daily return of the series,
//! not a one-off event.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Named return shock scenarios.
///
/// Deserializes leniently through [`ScenarioKind::parse`], so unknown names
/// become `Baseline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ScenarioKind {
    /// -10% on every daily return
    MarketCrash,
    /// -2% on every daily return
    RateHike,
    /// No shock
    #[default]
    Baseline,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::MarketCrash,
        ScenarioKind::RateHike,
        ScenarioKind::Baseline,
    ];

    /// Additive shock applied to each daily return.
    pub fn shock(&self) -> f64 {
        match self {
            ScenarioKind::MarketCrash => -0.10,
            ScenarioKind::RateHike => -0.02,
            ScenarioKind::Baseline => 0.0,
        }
    }

    /// Human-readable scenario name.
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::MarketCrash => "Market Crash -10%",
            ScenarioKind::RateHike => "Interest Rate Hike +2%",
            ScenarioKind::Baseline => "Baseline",
        }
    }

    /// Parse a scenario name; anything unrecognized is `Baseline`.
    pub fn parse(name: &str) -> Self {
        let normalized: String = name
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        Self::ALL
            .into_iter()
            .find(|kind| {
                let label: String = kind
                    .label()
                    .to_lowercase()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                let id: String = kind.id().chars().filter(|c| *c != '_').collect();
                normalized == label || normalized == id
            })
            .unwrap_or_else(|| {
                tracing::debug!(scenario = name, "unknown scenario, using baseline");
                ScenarioKind::Baseline
            })
    }

    fn id(&self) -> &'static str {
        match self {
            ScenarioKind::MarketCrash => "market_crash",
            ScenarioKind::RateHike => "rate_hike",
            ScenarioKind::Baseline => "baseline",
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for ScenarioKind {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Baseline versus shocked mean daily return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StressTestSummary {
    pub scenario: ScenarioKind,
    pub baseline_mean_return: f64,
    pub shocked_mean_return: f64,
    /// Shocked mean minus baseline mean
    pub impact: f64,
    pub shocked_returns: Vec<f64>,
}

/// Shock every daily return by the scenario's offset and compare means.
pub fn apply_scenario(returns: &[f64], scenario: ScenarioKind) -> Result<StressTestSummary> {
    if returns.is_empty() {
        return Err(Error::InsufficientData(
            "stress test requires at least one daily return".to_string(),
        ));
    }

    let shock = scenario.shock();
    let shocked_returns: Vec<f64> = returns.iter().map(|r| r + shock).collect();

    let n = returns.len() as f64;
    let baseline_mean_return = returns.iter().sum::<f64>() / n;
    let shocked_mean_return = shocked_returns.iter().sum::<f64>() / n;

    Ok(StressTestSummary {
        scenario,
        baseline_mean_return,
        shocked_mean_return,
        impact: shocked_mean_return - baseline_mean_return,
        shocked_returns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_market_crash() {
        let summary = apply_scenario(&[0.01, 0.02, -0.01], ScenarioKind::MarketCrash).unwrap();

        let expected = [-0.09, -0.08, -0.11];
        for (actual, expected) in summary.shocked_returns.iter().zip(expected) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(summary.baseline_mean_return, 0.02 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.impact, -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_rate_hike_and_baseline() {
        let returns = [0.004, -0.002, 0.001, 0.003];

        let hike = apply_scenario(&returns, ScenarioKind::RateHike).unwrap();
        assert_abs_diff_eq!(hike.impact, -0.02, epsilon = 1e-12);

        let baseline = apply_scenario(&returns, ScenarioKind::Baseline).unwrap();
        assert_eq!(baseline.impact, 0.0);
        assert_eq!(baseline.shocked_returns, returns.to_vec());
    }

    #[test]
    fn test_empty_returns_fail() {
        assert!(matches!(
            apply_scenario(&[], ScenarioKind::MarketCrash),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_parse_scenario_names() {
        assert_eq!(ScenarioKind::parse("market_crash"), ScenarioKind::MarketCrash);
        assert_eq!(ScenarioKind::parse("Market Crash -10%"), ScenarioKind::MarketCrash);
        assert_eq!(ScenarioKind::parse("rate-hike"), ScenarioKind::RateHike);
        assert_eq!(
            ScenarioKind::parse("Interest Rate Hike +2%"),
            ScenarioKind::RateHike
        );
        assert_eq!(ScenarioKind::parse("baseline"), ScenarioKind::Baseline);
    }

    #[test]
    fn test_unknown_scenario_is_baseline() {
        assert_eq!(ScenarioKind::parse("alien invasion"), ScenarioKind::Baseline);
        assert_eq!("".parse::<ScenarioKind>().unwrap(), ScenarioKind::Baseline);

        let summary = apply_scenario(&[0.01], ScenarioKind::parse("???")).unwrap();
        assert_eq!(summary.impact, 0.0);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(
            serde_json::to_string(&ScenarioKind::MarketCrash).unwrap(),
            "\"market_crash\""
        );
        assert_eq!(
            serde_json::from_str::<ScenarioKind>("\"rate_hike\"").unwrap(),
            ScenarioKind::RateHike
        );
    }

    #[test]
    fn test_unknown_scenario_deserializes_as_baseline() {
        assert_eq!(
            serde_json::from_str::<ScenarioKind>("\"alien_invasion\"").unwrap(),
            ScenarioKind::Baseline
        );

        #[derive(serde::Deserialize)]
        struct Run {
            scenario: ScenarioKind,
        }
        let run: Run = toml::from_str("scenario = \"meteor\"").unwrap();
        assert_eq!(run.scenario, ScenarioKind::Baseline);
    }
}
