//! In-Memory Repository Implementations
//!
//! Thread-safe implementations of the traits in `domain::repositories`,
//! backed by `Arc<RwLock>` maps.
//!
//! # Limitations
//!
//! - Data is lost on restart
//! - `InMemoryTransactionManager` runs the unit of work directly and cannot
//!   roll back writes made before a failure
//!
//! Use the SQLite repositories in `infrastructure::persistence` when
//! atomicity matters.

use crate::domain::events::StoredEvent;
use crate::domain::investment::{Investment, InvestmentId};
use crate::domain::portfolio::{Portfolio, PortfolioId};
use crate::domain::repositories::{
    EventRepository, InvestmentRepository, PortfolioRepository, TransactionManager, UnitOfWork,
};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Portfolios keyed by id. Clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryPortfolioRepository {
    portfolios: Arc<RwLock<HashMap<PortfolioId, Portfolio>>>,
}

impl InMemoryPortfolioRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.portfolios.read().await.len()
    }
}

#[async_trait]
impl PortfolioRepository for InMemoryPortfolioRepository {
    async fn save(&self, portfolio: &Portfolio) -> Result<()> {
        self.portfolios
            .write()
            .await
            .insert(portfolio.id().clone(), portfolio.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PortfolioId) -> Result<Option<Portfolio>> {
        Ok(self.portfolios.read().await.get(id).cloned())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Portfolio>> {
        let portfolios = self.portfolios.read().await;
        Ok(portfolios
            .values()
            .filter(|p| p.user_id() == user_id)
            .min_by_key(|p| p.created_at())
            .cloned())
    }

    async fn find_by_investment_id(
        &self,
        investment_id: &InvestmentId,
    ) -> Result<Option<Portfolio>> {
        let portfolios = self.portfolios.read().await;
        Ok(portfolios
            .values()
            .find(|p| p.get_investment(investment_id).is_ok())
            .cloned())
    }

    async fn delete(&self, id: &PortfolioId) -> Result<()> {
        self.portfolios.write().await.remove(id);
        Ok(())
    }
}

/// Investments keyed by id. Portfolio membership is read from the
/// portfolio repository it was built with.
#[derive(Clone)]
pub struct InMemoryInvestmentRepository {
    investments: Arc<RwLock<HashMap<InvestmentId, Investment>>>,
    portfolios: InMemoryPortfolioRepository,
}

impl InMemoryInvestmentRepository {
    pub fn new(portfolios: InMemoryPortfolioRepository) -> Self {
        Self {
            investments: Arc::new(RwLock::new(HashMap::new())),
            portfolios,
        }
    }
}

#[async_trait]
impl InvestmentRepository for InMemoryInvestmentRepository {
    async fn save(&self, investment: &Investment) -> Result<()> {
        self.investments
            .write()
            .await
            .insert(investment.id().clone(), investment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &InvestmentId) -> Result<Option<Investment>> {
        Ok(self.investments.read().await.get(id).cloned())
    }

    async fn find_all_by_portfolio_id(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Vec<Investment>> {
        let Some(portfolio) = self.portfolios.find_by_id(portfolio_id).await? else {
            return Ok(Vec::new());
        };

        let mut investments: Vec<Investment> =
            portfolio.investments().into_iter().cloned().collect();
        investments.sort_by_key(|i| i.created_at());
        Ok(investments)
    }

    async fn delete(&self, id: &InvestmentId) -> Result<()> {
        self.investments.write().await.remove(id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn append(&self, event: &StoredEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        let events = self.events.read().await;
        Ok(events.iter().rev().take(limit).cloned().collect())
    }

    async fn find_by_aggregate_id(&self, aggregate_id: &str) -> Result<Vec<StoredEvent>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }
}

/// Runs the unit of work as-is.
#[derive(Clone, Copy, Default)]
pub struct InMemoryTransactionManager;

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn run_in_transaction<'a>(&'a self, work: UnitOfWork<'a>) -> Result<()> {
        work.await
    }
}
