//! Repository Pattern Abstractions
//!
//! Storage collaborators the use cases depend on. Implementations live in
//! `infrastructure` (SQLite and in-memory).
//!
//! # Transactions
//!
//! `TransactionManager::run_in_transaction` executes a unit of work
//! atomically. Repository calls made by the unit of work join the
//! transaction; any error rolls everything back.

use crate::domain::events::StoredEvent;
use crate::domain::investment::{Investment, InvestmentId};
use crate::domain::portfolio::{Portfolio, PortfolioId};
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;

/// Persists whole portfolio aggregates together with their investments.
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    /// Insert or update the portfolio, its investments and their links.
    async fn save(&self, portfolio: &Portfolio) -> Result<()>;

    async fn find_by_id(&self, id: &PortfolioId) -> Result<Option<Portfolio>>;

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Portfolio>>;

    async fn find_by_investment_id(&self, investment_id: &InvestmentId)
    -> Result<Option<Portfolio>>;

    async fn delete(&self, id: &PortfolioId) -> Result<()>;
}

#[async_trait]
pub trait InvestmentRepository: Send + Sync {
    async fn save(&self, investment: &Investment) -> Result<()>;

    async fn find_by_id(&self, id: &InvestmentId) -> Result<Option<Investment>>;

    async fn find_all_by_portfolio_id(&self, portfolio_id: &PortfolioId)
    -> Result<Vec<Investment>>;

    async fn delete(&self, id: &InvestmentId) -> Result<()>;
}

/// Append-only audit log of domain events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn append(&self, event: &StoredEvent) -> Result<()>;

    /// Most recent events first.
    async fn find_recent(&self, limit: usize) -> Result<Vec<StoredEvent>>;

    async fn find_by_aggregate_id(&self, aggregate_id: &str) -> Result<Vec<StoredEvent>>;
}

pub type UnitOfWork<'a> = BoxFuture<'a, Result<()>>;

#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn run_in_transaction<'a>(&'a self, work: UnitOfWork<'a>) -> Result<()>;
}
