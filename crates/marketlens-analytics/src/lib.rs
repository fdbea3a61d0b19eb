//! Pure analytics over a collected [`marketlens_core::Universe`].
//!
//! Every analyzer borrows the universe immutably and returns an owned,
//! serializable value object. Statistical degeneracies (zero variance, too
//! few observations for a moment) surface as `None`, never as `NaN`.

pub mod correlation;
pub mod error;
pub mod master;
pub mod performance;
pub mod portfolio;
pub mod risk;
pub mod sector;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use correlation::{CorrelationAnalyzer, CorrelationMatrix};
pub use error::AnalyticsError;
pub use master::{DateRange, MasterMatrix};
pub use performance::TRADING_DAYS;
pub use portfolio::{PortfolioAnalyzer, PortfolioHolding, PortfolioMetrics, PortfolioSpec};
pub use risk::{RiskAnalyzer, RiskMetrics, MIN_OBSERVATIONS};
pub use sector::{sector_performance, SectorAggregator, SectorPerformance, TickerReturn};
pub use summary::{
    company_summary, monthly_returns, risk_return_points, CompanySummary, MonthlyReturn,
    RiskReturnPoint, RiskReturnReport,
};
