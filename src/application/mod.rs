pub mod bootstrap;

// Use cases driving the portfolio aggregate
pub mod investment_use_case;
pub mod portfolio_use_case;

pub use investment_use_case::{InvestmentUseCase, InvestmentWithRisk};
pub use portfolio_use_case::{PortfolioAnalysis, PortfolioUseCase};
