use crate::domain::events::{DomainEvent, EventListener, StoredEvent};
use crate::domain::repositories::EventRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Appends every published event to the audit log.
///
/// Runs inside the publisher's transaction when there is one, so a failed
/// append rolls the mutation back with it.
pub struct EventStoreListener {
    repository: Arc<dyn EventRepository>,
}

impl EventStoreListener {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl EventListener for EventStoreListener {
    async fn on_event(&self, event: &DomainEvent) -> Result<()> {
        let stored = StoredEvent::from_event(event).context("Failed to serialize event")?;
        self.repository.append(&stored).await?;
        debug!("Stored event {} ({})", stored.id, stored.event_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EventKind;
    use crate::domain::investment::InvestmentId;
    use crate::domain::money::{Currency, Money};
    use crate::infrastructure::repositories::InMemoryEventRepository;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_events_are_appended() {
        let repository = InMemoryEventRepository::new();
        let listener = EventStoreListener::new(Arc::new(repository.clone()));

        let event = DomainEvent::investment_created(
            InvestmentId::new("inv-1"),
            Money::new(dec!(5000), Currency::Usd).unwrap(),
        );
        listener.on_event(&event).await.unwrap();

        let stored = repository.find_by_aggregate_id("inv-1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].event_type, EventKind::InvestmentCreated);
        assert_eq!(stored[0].aggregate_type, "Investment");
    }
}
