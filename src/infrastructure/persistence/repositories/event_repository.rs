use crate::domain::events::{EventKind, StoredEvent};
use crate::domain::repositories::EventRepository;
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

pub struct SqliteEventRepository {
    database: Database,
}

impl SqliteEventRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn map_rows_to_events(&self, rows: Vec<SqliteRow>) -> Result<Vec<StoredEvent>> {
        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_type: String = row.try_get("event_type")?;
            let event_data: String = row.try_get("event_data")?;
            let occurred_at: DateTime<Utc> = row.try_get("occurred_at")?;

            events.push(StoredEvent {
                id: row.try_get("id")?,
                aggregate_id: row.try_get("aggregate_id")?,
                aggregate_type: row.try_get("aggregate_type")?,
                event_type: EventKind::from(event_type.as_str()),
                event_data: serde_json::from_str(&event_data)
                    .context("Stored event data is not valid JSON")?,
                occurred_at,
            });
        }
        Ok(events)
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn append(&self, event: &StoredEvent) -> Result<()> {
        self.database
            .execute(
                sqlx::query(
                    r#"
                    INSERT INTO events (id, aggregate_id, aggregate_type, event_type, event_data, occurred_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&event.id)
                .bind(&event.aggregate_id)
                .bind(&event.aggregate_type)
                .bind(event.event_type.as_str())
                .bind(event.event_data.to_string())
                .bind(event.occurred_at),
            )
            .await
            .context("Failed to append event")?;
        Ok(())
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        let rows = self
            .database
            .fetch_all(
                sqlx::query("SELECT * FROM events ORDER BY occurred_at DESC LIMIT ?")
                    .bind(i64::try_from(limit).unwrap_or(i64::MAX)),
            )
            .await?;
        self.map_rows_to_events(rows)
    }

    async fn find_by_aggregate_id(&self, aggregate_id: &str) -> Result<Vec<StoredEvent>> {
        let rows = self
            .database
            .fetch_all(
                sqlx::query("SELECT * FROM events WHERE aggregate_id = ? ORDER BY occurred_at ASC")
                    .bind(aggregate_id),
            )
            .await?;
        self.map_rows_to_events(rows)
    }
}
