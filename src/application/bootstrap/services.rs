use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::application::bootstrap::persistence::PersistenceHandle;
use crate::application::investment_use_case::InvestmentUseCase;
use crate::application::portfolio_use_case::PortfolioUseCase;
use crate::config::Config;
use crate::domain::events::{DomainEventPublisher, LoggingListener};
use crate::domain::services::InvestmentStrategyService;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::event_store::EventStoreListener;

pub struct ServicesHandle {
    pub event_bus: EventBus,
    pub portfolio_use_case: Arc<PortfolioUseCase>,
    pub investment_use_case: Arc<InvestmentUseCase>,
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    pub async fn init(config: &Config, persistence: &PersistenceHandle) -> Result<ServicesHandle> {
        // 1. Event bus: audit log first, then logging
        let event_bus = EventBus::new();
        event_bus
            .subscribe(Arc::new(EventStoreListener::new(
                persistence.event_repository.clone(),
            )))
            .await;
        event_bus.subscribe(Arc::new(LoggingListener)).await;

        // 2. Use cases
        let publisher: Arc<dyn DomainEventPublisher> = Arc::new(event_bus.clone());
        let strategy_service = InvestmentStrategyService::new();

        let portfolio_use_case = Arc::new(PortfolioUseCase::new(
            persistence.portfolio_repository.clone(),
            persistence.transaction_manager.clone(),
            publisher.clone(),
            strategy_service.clone(),
            config.default_currency,
        ));

        let investment_use_case = Arc::new(InvestmentUseCase::new(
            persistence.investment_repository.clone(),
            persistence.portfolio_repository.clone(),
            persistence.transaction_manager.clone(),
            publisher,
            strategy_service,
        ));

        info!(
            "Services ready ({} event listener(s))",
            event_bus.subscriber_count().await
        );

        Ok(ServicesHandle {
            event_bus,
            portfolio_use_case,
            investment_use_case,
        })
    }
}
