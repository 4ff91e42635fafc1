use anyhow::{Context, Result, anyhow};

use crate::domain::repositories::UnitOfWork;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteQueryResult,
    SqliteRow,
};
use sqlx::{Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Sqlite>>>>;

tokio::task_local! {
    // Transaction joined by every query issued from the current unit of work
    static ACTIVE_TRANSACTION: SharedTransaction;
}

fn active_transaction() -> Option<SharedTransaction> {
    ACTIVE_TRANSACTION.try_with(Arc::clone).ok()
}

/// Shared SQLite handle.
///
/// Queries go through [`Database::execute`], [`Database::fetch_all`] and
/// [`Database::fetch_optional`], which run on the caller's transaction when
/// one is active and on the pool otherwise.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = db_url.contains(":memory:");

        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let mut options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        }

        // Every connection to an in-memory URL opens its own database, so
        // keep exactly one alive for the lifetime of the pool.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS portfolios (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_portfolios_user
            ON portfolios (user_id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create portfolios table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS investments (
                id TEXT PRIMARY KEY,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                type TEXT NOT NULL,
                strategy TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create investments table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS portfolio_investments (
                portfolio_id TEXT NOT NULL REFERENCES portfolios (id) ON DELETE CASCADE,
                investment_id TEXT NOT NULL REFERENCES investments (id) ON DELETE CASCADE,
                PRIMARY KEY (portfolio_id, investment_id)
            );
            CREATE INDEX IF NOT EXISTS idx_portfolio_investments_investment
            ON portfolio_investments (investment_id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create portfolio_investments table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                aggregate_id TEXT NOT NULL,
                aggregate_type TEXT NOT NULL,
                event_type TEXT NOT NULL,
                event_data TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_aggregate
            ON events (aggregate_id, occurred_at);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create events table")?;

        info!("Database schema initialized.");
        Ok(())
    }

    /// Run `work` atomically. Nested calls join the outer transaction.
    pub async fn transaction<'a>(&self, work: UnitOfWork<'a>) -> Result<()> {
        if active_transaction().is_some() {
            return work.await;
        }

        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let shared: SharedTransaction = Arc::new(Mutex::new(Some(tx)));

        let result = ACTIVE_TRANSACTION.scope(Arc::clone(&shared), work).await;

        let tx = shared
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow!("Transaction was finished inside its unit of work"))?;

        match result {
            Ok(()) => {
                tx.commit().await.context("Failed to commit transaction")?;
                debug!("Transaction committed");
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        "Rollback failed: {} (original error: {})",
                        rollback_err, err
                    );
                } else {
                    debug!("Transaction rolled back: {}", err);
                }
                Err(err)
            }
        }
    }

    pub async fn execute<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<SqliteQueryResult> {
        match active_transaction() {
            Some(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard
                    .as_mut()
                    .ok_or_else(|| anyhow!("No open transaction"))?;
                Ok(query.execute(&mut **tx).await?)
            }
            None => Ok(query.execute(&self.pool).await?),
        }
    }

    pub async fn fetch_all<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<Vec<SqliteRow>> {
        match active_transaction() {
            Some(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard
                    .as_mut()
                    .ok_or_else(|| anyhow!("No open transaction"))?;
                Ok(query.fetch_all(&mut **tx).await?)
            }
            None => Ok(query.fetch_all(&self.pool).await?),
        }
    }

    pub async fn fetch_optional<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<Option<SqliteRow>> {
        match active_transaction() {
            Some(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard
                    .as_mut()
                    .ok_or_else(|| anyhow!("No open transaction"))?;
                Ok(query.fetch_optional(&mut **tx).await?)
            }
            None => Ok(query.fetch_optional(&self.pool).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    async fn memory_db() -> Database {
        Database::new("sqlite::memory:", 5).await.unwrap()
    }

    async fn count_portfolios(db: &Database) -> i64 {
        let row = db
            .fetch_optional(sqlx::query("SELECT COUNT(*) AS count FROM portfolios"))
            .await
            .unwrap()
            .unwrap();
        row.try_get("count").unwrap()
    }

    fn insert_portfolio(id: &str) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query(
            "INSERT INTO portfolios (id, user_id, created_at, updated_at) VALUES (?, 'u', 'now', 'now')",
        )
        .bind(id)
    }

    #[tokio::test]
    async fn test_transaction_commits() {
        let db = memory_db().await;
        let handle = db.clone();

        db.transaction(Box::pin(async move {
            handle.execute(insert_portfolio("p-1")).await?;
            handle.execute(insert_portfolio("p-2")).await?;
            Ok::<(), anyhow::Error>(())
        }))
        .await
        .unwrap();

        assert_eq!(count_portfolios(&db).await, 2);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let db = memory_db().await;
        let handle = db.clone();

        let result = db
            .transaction(Box::pin(async move {
                handle.execute(insert_portfolio("p-1")).await?;
                Err::<(), anyhow::Error>(anyhow!("boom"))
            }))
            .await;

        assert!(result.is_err());
        assert_eq!(count_portfolios(&db).await, 0);
    }

    #[tokio::test]
    async fn test_nested_transaction_joins_outer() {
        let db = memory_db().await;
        let outer = db.clone();

        let result = db
            .transaction(Box::pin(async move {
                let inner = outer.clone();
                outer
                    .transaction(Box::pin(async move {
                        inner.execute(insert_portfolio("p-1")).await?;
                        Ok::<(), anyhow::Error>(())
                    }))
                    .await?;
                Err::<(), anyhow::Error>(anyhow!("outer failure"))
            }))
            .await;

        assert!(result.is_err());
        assert_eq!(count_portfolios(&db).await, 0);
    }
}
