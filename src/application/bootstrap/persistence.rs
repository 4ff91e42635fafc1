use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::DatabaseEnvConfig;
use crate::domain::repositories::{
    EventRepository, InvestmentRepository, PortfolioRepository, TransactionManager,
};
use crate::infrastructure::persistence::SqliteTransactionManager;
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::repositories::{
    SqliteEventRepository, SqliteInvestmentRepository, SqlitePortfolioRepository,
};

pub struct PersistenceHandle {
    pub db: Database,
    pub portfolio_repository: Arc<dyn PortfolioRepository>,
    pub investment_repository: Arc<dyn InvestmentRepository>,
    pub event_repository: Arc<dyn EventRepository>,
    pub transaction_manager: Arc<dyn TransactionManager>,
}

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    pub async fn init(config: &DatabaseEnvConfig) -> Result<PersistenceHandle> {
        info!("Initializing Database at {}", config.url);

        let db = Database::new(&config.url, config.max_connections)
            .await
            .context("Failed to initialize database")?;

        Ok(PersistenceHandle {
            portfolio_repository: Arc::new(SqlitePortfolioRepository::new(db.clone())),
            investment_repository: Arc::new(SqliteInvestmentRepository::new(db.clone())),
            event_repository: Arc::new(SqliteEventRepository::new(db.clone())),
            transaction_manager: Arc::new(SqliteTransactionManager::new(db.clone())),
            db,
        })
    }
}
