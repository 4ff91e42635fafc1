use crate::domain::events::{DomainEvent, DomainEventPublisher, EventListener};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Event bus fanning domain events out to listeners in registration order.
///
/// Built once per process and handed to whoever publishes or subscribes.
pub struct EventBus {
    listeners: Arc<RwLock<Vec<Arc<dyn EventListener>>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get count of subscribers (for testing)
    pub async fn subscriber_count(&self) -> usize {
        self.listeners.read().await.len()
    }
}

#[async_trait]
impl DomainEventPublisher for EventBus {
    /// Invoke every listener in turn. The first failing listener stops the
    /// fan-out and its error is returned.
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        let listeners = self.listeners.read().await;
        debug!(
            "Publishing {} to {} listener(s)",
            event.kind(),
            listeners.len()
        );
        for listener in listeners.iter() {
            listener.on_event(&event).await?;
        }
        Ok(())
    }

    async fn subscribe(&self, listener: Arc<dyn EventListener>) {
        self.listeners.write().await.push(listener);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}
