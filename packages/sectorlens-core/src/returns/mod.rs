//! Return and risk calculations.
//!
//! Converts price series into daily returns and derives CAGR, volatility,
//! Sharpe ratio, value at risk, beta and correlations.

mod performance;
mod risk;

pub use performance::{
    align_prices, annualize_growth, cagr, cagr_from_returns, cumulative_growth, daily_returns,
    normalized_portfolio_value, portfolio_daily_returns, AlignedPrices, ValuePoint,
    DAYS_PER_YEAR,
};
pub use risk::{
    beta, correlation_matrix, percentile, performance_metrics, sharpe, value_at_risk_95,
    volatility, CorrelationMatrix, TRADING_DAYS_PER_YEAR,
};
