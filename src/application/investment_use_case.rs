use crate::domain::errors::DomainError;
use crate::domain::events::{DomainEvent, DomainEventPublisher};
use crate::domain::investment::{Investment, InvestmentId};
use crate::domain::money::Money;
use crate::domain::portfolio::{Portfolio, PortfolioId};
use crate::domain::repositories::{InvestmentRepository, PortfolioRepository, TransactionManager};
use crate::domain::services::{InvestmentStrategyService, RebalancingSuggestion};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct InvestmentWithRisk {
    pub investment: Investment,
    pub portfolio_id: PortfolioId,
    /// Risk score of the owning portfolio.
    pub risk_score: f64,
}

pub struct InvestmentUseCase {
    investment_repository: Arc<dyn InvestmentRepository>,
    portfolio_repository: Arc<dyn PortfolioRepository>,
    transaction_manager: Arc<dyn TransactionManager>,
    publisher: Arc<dyn DomainEventPublisher>,
    strategy_service: InvestmentStrategyService,
}

impl InvestmentUseCase {
    pub fn new(
        investment_repository: Arc<dyn InvestmentRepository>,
        portfolio_repository: Arc<dyn PortfolioRepository>,
        transaction_manager: Arc<dyn TransactionManager>,
        publisher: Arc<dyn DomainEventPublisher>,
        strategy_service: InvestmentStrategyService,
    ) -> Self {
        Self {
            investment_repository,
            portfolio_repository,
            transaction_manager,
            publisher,
            strategy_service,
        }
    }

    /// Add a new investment to the user's portfolio.
    ///
    /// The strategy service pre-checks the ceiling and the aggressive ratio,
    /// then the portfolio re-checks its own invariants on insertion. Both
    /// stores and the `InvestmentCreated` event commit together.
    pub async fn create_investment(
        &self,
        user_id: &str,
        amount: Decimal,
        currency: &str,
        investment_type: &str,
        strategy: &str,
    ) -> Result<Investment> {
        let money = Money::parse(amount, currency)?;
        let investment =
            Investment::create(InvestmentId::generate(), money, investment_type, strategy)?;

        self.transaction_manager
            .run_in_transaction(Box::pin(async {
                let mut portfolio = self
                    .portfolio_repository
                    .find_by_user_id(user_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Portfolio for user", user_id))?;

                if let Err(e) = self
                    .strategy_service
                    .validate_investment_strategy(&investment, &portfolio)
                {
                    warn!(
                        "Rejected {} investment for portfolio {}: {}",
                        investment.strategy(),
                        portfolio.id(),
                        e
                    );
                    return Err(e.into());
                }

                portfolio.add_investment(investment.clone())?;

                self.investment_repository.save(&investment).await?;
                self.portfolio_repository.save(&portfolio).await?;
                self.publisher
                    .publish(DomainEvent::investment_created(
                        investment.id().clone(),
                        investment.amount(),
                    ))
                    .await?;
                Ok::<(), anyhow::Error>(())
            }))
            .await?;

        info!(
            "Created investment {} ({} {} {})",
            investment.id(),
            investment.amount(),
            investment.investment_type(),
            investment.strategy()
        );
        Ok(investment)
    }

    pub async fn get_investment(&self, id: &str) -> Result<Investment> {
        self.investment_repository
            .find_by_id(&InvestmentId::new(id))
            .await?
            .ok_or_else(|| DomainError::not_found("Investment", id).into())
    }

    pub async fn get_portfolio_investments(&self, portfolio_id: &str) -> Result<Vec<Investment>> {
        let portfolio_id = PortfolioId::new(portfolio_id);
        self.load_portfolio(&portfolio_id).await?;
        self.investment_repository
            .find_all_by_portfolio_id(&portfolio_id)
            .await
    }

    pub async fn get_investment_with_risk_analysis(&self, id: &str) -> Result<InvestmentWithRisk> {
        let investment = self.get_investment(id).await?;
        let portfolio = self.owning_portfolio(investment.id()).await?;

        Ok(InvestmentWithRisk {
            risk_score: self.strategy_service.calculate_risk_score(&portfolio),
            portfolio_id: portfolio.id().clone(),
            investment,
        })
    }

    pub async fn get_rebalancing_suggestions(
        &self,
        portfolio_id: &str,
    ) -> Result<Vec<RebalancingSuggestion>> {
        let portfolio = self.load_portfolio(&PortfolioId::new(portfolio_id)).await?;
        Ok(self.strategy_service.suggest_rebalancing(&portfolio))
    }

    /// Drop an investment from its portfolio and from the investment store.
    pub async fn remove_investment(&self, id: &str) -> Result<Investment> {
        let investment_id = InvestmentId::new(id);

        let mut removed = None;
        self.transaction_manager
            .run_in_transaction(Box::pin(async {
                let mut portfolio = self.owning_portfolio(&investment_id).await?;
                let investment = portfolio.remove_investment(&investment_id)?;

                self.portfolio_repository.save(&portfolio).await?;
                self.investment_repository.delete(&investment_id).await?;
                self.publisher
                    .publish(DomainEvent::portfolio_updated(
                        portfolio.id().clone(),
                        portfolio.calculate_total_amount(),
                    ))
                    .await?;

                removed = Some(investment);
                Ok::<(), anyhow::Error>(())
            }))
            .await?;

        let investment = removed.ok_or_else(|| DomainError::Internal {
            reason: format!("removal of investment {} produced no result", id),
        })?;
        info!("Removed investment {}", investment.id());
        Ok(investment)
    }

    async fn load_portfolio(&self, id: &PortfolioId) -> Result<Portfolio> {
        self.portfolio_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Portfolio", id.as_str()).into())
    }

    async fn owning_portfolio(&self, investment_id: &InvestmentId) -> Result<Portfolio> {
        self.portfolio_repository
            .find_by_investment_id(investment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Investment", investment_id.as_str()).into())
    }
}
