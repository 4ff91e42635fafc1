mod event_repository;
mod investment_repository;
mod portfolio_repository;

pub use event_repository::SqliteEventRepository;
pub use investment_repository::SqliteInvestmentRepository;
pub use portfolio_repository::SqlitePortfolioRepository;
