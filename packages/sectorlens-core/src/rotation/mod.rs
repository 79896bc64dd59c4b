//! Sector rotation.
//!
//! Flags underperforming holdings and proposes replacement sectors from the
//! sector ranking, respecting the portfolio's current sector concentration.

mod recommend;
mod underperformance;

pub use recommend::{Recommendation, ReplacementRecommender};
pub use underperformance::{find_underperformers, Underperformer, DEFAULT_UNDERPERFORMANCE_RATIO};
