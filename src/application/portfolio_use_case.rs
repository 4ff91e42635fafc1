use crate::domain::errors::DomainError;
use crate::domain::events::{DomainEvent, DomainEventPublisher};
use crate::domain::investment::{InvestmentId, InvestmentStrategy};
use crate::domain::money::{Currency, Money};
use crate::domain::portfolio::{Portfolio, PortfolioId};
use crate::domain::repositories::{PortfolioRepository, TransactionManager};
use crate::domain::services::{InvestmentStrategyService, RebalancingSuggestion};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Snapshot of a portfolio together with its risk evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioAnalysis {
    pub portfolio: Portfolio,
    pub total_amount: Money,
    pub risk_score: f64,
    pub strategy_allocation: HashMap<InvestmentStrategy, Decimal>,
    pub suggestions: Vec<RebalancingSuggestion>,
}

pub struct PortfolioUseCase {
    portfolio_repository: Arc<dyn PortfolioRepository>,
    transaction_manager: Arc<dyn TransactionManager>,
    publisher: Arc<dyn DomainEventPublisher>,
    strategy_service: InvestmentStrategyService,
    default_currency: Currency,
}

impl PortfolioUseCase {
    pub fn new(
        portfolio_repository: Arc<dyn PortfolioRepository>,
        transaction_manager: Arc<dyn TransactionManager>,
        publisher: Arc<dyn DomainEventPublisher>,
        strategy_service: InvestmentStrategyService,
        default_currency: Currency,
    ) -> Self {
        Self {
            portfolio_repository,
            transaction_manager,
            publisher,
            strategy_service,
            default_currency,
        }
    }

    /// Create an empty portfolio for a user who has none yet.
    pub async fn create_portfolio(&self, user_id: &str) -> Result<Portfolio> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(DomainError::InvalidInput {
                reason: "user id must not be empty".to_string(),
            }
            .into());
        }

        let portfolio = Portfolio::new(PortfolioId::generate(), user_id);
        let opening_total = Money::zero(self.default_currency);

        self.transaction_manager
            .run_in_transaction(Box::pin(async {
                if self
                    .portfolio_repository
                    .find_by_user_id(user_id)
                    .await?
                    .is_some()
                {
                    return Err(DomainError::InvalidInput {
                        reason: format!("user {} already has a portfolio", user_id),
                    }
                    .into());
                }

                self.portfolio_repository.save(&portfolio).await?;
                self.publisher
                    .publish(DomainEvent::portfolio_updated(
                        portfolio.id().clone(),
                        opening_total,
                    ))
                    .await?;
                Ok::<(), anyhow::Error>(())
            }))
            .await?;

        info!("Created portfolio {} for user {}", portfolio.id(), user_id);
        Ok(portfolio)
    }

    pub async fn get_portfolio(&self, id: &str) -> Result<Portfolio> {
        self.load(&PortfolioId::new(id)).await
    }

    pub async fn get_user_portfolio(&self, user_id: &str) -> Result<Portfolio> {
        self.portfolio_repository
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Portfolio for user", user_id).into())
    }

    pub async fn get_portfolio_analysis(&self, id: &str) -> Result<PortfolioAnalysis> {
        let portfolio = self.load(&PortfolioId::new(id)).await?;

        Ok(PortfolioAnalysis {
            total_amount: portfolio.calculate_total_amount(),
            risk_score: self.strategy_service.calculate_risk_score(&portfolio),
            strategy_allocation: portfolio.strategy_allocation(),
            suggestions: self.strategy_service.suggest_rebalancing(&portfolio),
            portfolio,
        })
    }

    /// Apply new amounts to existing investments as one unit.
    ///
    /// Decreases are applied before increases so an intermediate total never
    /// crosses the ceiling when the final one does not. The aggressive ratio
    /// is checked on the final state.
    pub async fn rebalance_portfolio(
        &self,
        id: &str,
        changes: HashMap<InvestmentId, Money>,
    ) -> Result<()> {
        let portfolio_id = PortfolioId::new(id);

        self.transaction_manager
            .run_in_transaction(Box::pin(async {
                let mut portfolio = self.load(&portfolio_id).await?;

                let mut ordered: Vec<(&InvestmentId, &Money)> = changes.iter().collect();
                ordered.sort_by_key(|(investment_id, amount)| {
                    let current = portfolio
                        .get_investment(investment_id)
                        .map(|i| i.amount().amount())
                        .unwrap_or_default();
                    (amount.amount() > current, (*investment_id).clone())
                });

                for (investment_id, amount) in ordered {
                    portfolio.update_investment_amount(investment_id, *amount)?;
                }

                portfolio.validate_risk_distribution()?;

                self.portfolio_repository.save(&portfolio).await?;
                self.publisher
                    .publish(DomainEvent::portfolio_updated(
                        portfolio.id().clone(),
                        portfolio.calculate_total_amount(),
                    ))
                    .await?;
                Ok::<(), anyhow::Error>(())
            }))
            .await?;

        info!(
            "Rebalanced portfolio {} ({} change(s))",
            portfolio_id,
            changes.len()
        );
        Ok(())
    }

    pub async fn validate_portfolio(&self, id: &str) -> Result<()> {
        let portfolio = self.load(&PortfolioId::new(id)).await?;
        portfolio.validate_risk_distribution()?;
        Ok(())
    }

    pub async fn delete_portfolio(&self, id: &str) -> Result<()> {
        let portfolio_id = PortfolioId::new(id);

        self.transaction_manager
            .run_in_transaction(Box::pin(async {
                self.load(&portfolio_id).await?;
                self.portfolio_repository.delete(&portfolio_id).await?;
                Ok::<(), anyhow::Error>(())
            }))
            .await?;

        info!("Deleted portfolio {}", portfolio_id);
        Ok(())
    }

    async fn load(&self, id: &PortfolioId) -> Result<Portfolio> {
        self.portfolio_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Portfolio", id.as_str()).into())
    }
}
