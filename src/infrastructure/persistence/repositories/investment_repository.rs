use crate::domain::investment::{Investment, InvestmentId, InvestmentStrategy, InvestmentType};
use crate::domain::money::Money;
use crate::domain::portfolio::PortfolioId;
use crate::domain::repositories::InvestmentRepository;
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::str::FromStr;
use tracing::debug;

pub struct SqliteInvestmentRepository {
    database: Database,
}

impl SqliteInvestmentRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl InvestmentRepository for SqliteInvestmentRepository {
    async fn save(&self, investment: &Investment) -> Result<()> {
        upsert_investment(&self.database, investment).await
    }

    async fn find_by_id(&self, id: &InvestmentId) -> Result<Option<Investment>> {
        let row = self
            .database
            .fetch_optional(sqlx::query("SELECT * FROM investments WHERE id = ?").bind(id.as_str()))
            .await
            .context("Failed to load investment")?;

        row.as_ref().map(map_row_to_investment).transpose()
    }

    async fn find_all_by_portfolio_id(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Vec<Investment>> {
        find_investments_for_portfolio(&self.database, portfolio_id).await
    }

    async fn delete(&self, id: &InvestmentId) -> Result<()> {
        let database = &self.database;
        database
            .transaction(Box::pin(async move {
                database
                    .execute(
                        sqlx::query("DELETE FROM portfolio_investments WHERE investment_id = ?")
                            .bind(id.as_str()),
                    )
                    .await?;
                database
                    .execute(sqlx::query("DELETE FROM investments WHERE id = ?").bind(id.as_str()))
                    .await?;
                Ok::<(), anyhow::Error>(())
            }))
            .await
            .context("Failed to delete investment")?;

        debug!("Deleted investment {}", id);
        Ok(())
    }
}

pub(super) async fn upsert_investment(database: &Database, investment: &Investment) -> Result<()> {
    let amount = investment.amount();
    database
        .execute(
            sqlx::query(
                r#"
                INSERT INTO investments (id, amount, currency, type, strategy, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    amount = excluded.amount,
                    currency = excluded.currency,
                    type = excluded.type,
                    strategy = excluded.strategy,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(investment.id().as_str())
            .bind(amount.amount().to_string())
            .bind(amount.currency().code())
            .bind(investment.investment_type().to_string())
            .bind(investment.strategy().to_string())
            .bind(investment.created_at())
            .bind(investment.updated_at()),
        )
        .await
        .context("Failed to save investment")?;

    debug!("Persisted investment {}", investment.id());
    Ok(())
}

pub(super) async fn find_investments_for_portfolio(
    database: &Database,
    portfolio_id: &PortfolioId,
) -> Result<Vec<Investment>> {
    let rows = database
        .fetch_all(
            sqlx::query(
                r#"
                SELECT i.*
                FROM investments i
                JOIN portfolio_investments pi ON i.id = pi.investment_id
                WHERE pi.portfolio_id = ?
                ORDER BY i.created_at ASC
                "#,
            )
            .bind(portfolio_id.as_str()),
        )
        .await
        .context("Failed to load portfolio investments")?;

    rows.iter().map(map_row_to_investment).collect()
}

fn map_row_to_investment(row: &SqliteRow) -> Result<Investment> {
    let id: String = row.try_get("id")?;
    let amount_str: String = row.try_get("amount")?;
    let currency: String = row.try_get("currency")?;
    let type_str: String = row.try_get("type")?;
    let strategy_str: String = row.try_get("strategy")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    let amount = Decimal::from_str(&amount_str)
        .with_context(|| format!("Invalid stored amount for investment {}", id))?;

    Ok(Investment::restore(
        InvestmentId::new(id),
        Money::parse(amount, &currency)?,
        InvestmentType::from_str(&type_str)?,
        InvestmentStrategy::from_str(&strategy_str)?,
        created_at,
        updated_at,
    ))
}
