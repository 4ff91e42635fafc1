use super::investment_repository::{find_investments_for_portfolio, upsert_investment};
use crate::domain::investment::InvestmentId;
use crate::domain::portfolio::{Portfolio, PortfolioId};
use crate::domain::repositories::PortfolioRepository;
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::info;

pub struct SqlitePortfolioRepository {
    database: Database,
}

impl SqlitePortfolioRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    async fn load(&self, row: Option<SqliteRow>) -> Result<Option<Portfolio>> {
        let Some(row) = row else {
            return Ok(None);
        };

        let id = PortfolioId::new(row.try_get::<String, _>("id")?);
        let user_id: String = row.try_get("user_id")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        let investments = find_investments_for_portfolio(&self.database, &id).await?;
        let portfolio = Portfolio::restore(id, user_id, investments, created_at, updated_at)
            .context("Stored portfolio violates its invariants")?;
        Ok(Some(portfolio))
    }
}

#[async_trait]
impl PortfolioRepository for SqlitePortfolioRepository {
    async fn save(&self, portfolio: &Portfolio) -> Result<()> {
        let database = &self.database;
        database
            .transaction(Box::pin(async move {
                database
                    .execute(
                        sqlx::query(
                            r#"
                            INSERT INTO portfolios (id, user_id, created_at, updated_at)
                            VALUES (?, ?, ?, ?)
                            ON CONFLICT(id) DO UPDATE SET
                                user_id = excluded.user_id,
                                updated_at = excluded.updated_at
                            "#,
                        )
                        .bind(portfolio.id().as_str())
                        .bind(portfolio.user_id())
                        .bind(portfolio.created_at())
                        .bind(portfolio.updated_at()),
                    )
                    .await?;

                for investment in portfolio.investments() {
                    upsert_investment(database, investment).await?;
                }

                database
                    .execute(
                        sqlx::query("DELETE FROM portfolio_investments WHERE portfolio_id = ?")
                            .bind(portfolio.id().as_str()),
                    )
                    .await?;

                for investment in portfolio.investments() {
                    database
                        .execute(
                            sqlx::query(
                                "INSERT INTO portfolio_investments (portfolio_id, investment_id) VALUES (?, ?)",
                            )
                            .bind(portfolio.id().as_str())
                            .bind(investment.id().as_str()),
                        )
                        .await?;
                }
                Ok::<(), anyhow::Error>(())
            }))
            .await
            .context("Failed to save portfolio")?;

        info!(
            "Persisted portfolio {} ({} investments)",
            portfolio.id(),
            portfolio.len()
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &PortfolioId) -> Result<Option<Portfolio>> {
        let row = self
            .database
            .fetch_optional(sqlx::query("SELECT * FROM portfolios WHERE id = ?").bind(id.as_str()))
            .await
            .context("Failed to load portfolio")?;
        self.load(row).await
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Portfolio>> {
        let row = self
            .database
            .fetch_optional(
                sqlx::query("SELECT * FROM portfolios WHERE user_id = ? ORDER BY created_at LIMIT 1")
                    .bind(user_id),
            )
            .await
            .context("Failed to load portfolio by user")?;
        self.load(row).await
    }

    async fn find_by_investment_id(
        &self,
        investment_id: &InvestmentId,
    ) -> Result<Option<Portfolio>> {
        let row = self
            .database
            .fetch_optional(
                sqlx::query(
                    r#"
                    SELECT p.*
                    FROM portfolios p
                    JOIN portfolio_investments pi ON p.id = pi.portfolio_id
                    WHERE pi.investment_id = ?
                    "#,
                )
                .bind(investment_id.as_str()),
            )
            .await
            .context("Failed to load portfolio by investment")?;
        self.load(row).await
    }

    async fn delete(&self, id: &PortfolioId) -> Result<()> {
        let database = &self.database;
        database
            .transaction(Box::pin(async move {
                // Owned investments go with the portfolio
                database
                    .execute(
                        sqlx::query(
                            r#"
                            DELETE FROM investments WHERE id IN (
                                SELECT investment_id FROM portfolio_investments WHERE portfolio_id = ?
                            )
                            "#,
                        )
                        .bind(id.as_str()),
                    )
                    .await?;
                database
                    .execute(
                        sqlx::query("DELETE FROM portfolio_investments WHERE portfolio_id = ?")
                            .bind(id.as_str()),
                    )
                    .await?;
                database
                    .execute(sqlx::query("DELETE FROM portfolios WHERE id = ?").bind(id.as_str()))
                    .await?;
                Ok::<(), anyhow::Error>(())
            }))
            .await
            .context("Failed to delete portfolio")?;

        info!("Deleted portfolio {}", id);
        Ok(())
    }
}
