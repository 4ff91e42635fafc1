use crate::domain::repositories::{TransactionManager, UnitOfWork};
use crate::infrastructure::persistence::database::Database;
use anyhow::Result;
use async_trait::async_trait;

/// Transaction boundary backed by a single SQLite transaction.
pub struct SqliteTransactionManager {
    database: Database,
}

impl SqliteTransactionManager {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl TransactionManager for SqliteTransactionManager {
    async fn run_in_transaction<'a>(&'a self, work: UnitOfWork<'a>) -> Result<()> {
        self.database.transaction(work).await
    }
}
