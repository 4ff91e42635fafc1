//! Domain events published after successful mutations.

use crate::domain::investment::InvestmentId;
use crate::domain::money::Money;
use crate::domain::portfolio::PortfolioId;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Immutable fact about a state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type")]
pub enum DomainEvent {
    InvestmentCreated {
        investment_id: InvestmentId,
        amount: Money,
        occurred_at: DateTime<Utc>,
    },
    PortfolioUpdated {
        portfolio_id: PortfolioId,
        total_amount: Money,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn investment_created(investment_id: InvestmentId, amount: Money) -> Self {
        DomainEvent::InvestmentCreated {
            investment_id,
            amount,
            occurred_at: Utc::now(),
        }
    }

    pub fn portfolio_updated(portfolio_id: PortfolioId, total_amount: Money) -> Self {
        DomainEvent::PortfolioUpdated {
            portfolio_id,
            total_amount,
            occurred_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::InvestmentCreated { .. } => EventKind::InvestmentCreated,
            DomainEvent::PortfolioUpdated { .. } => EventKind::PortfolioUpdated,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::InvestmentCreated { occurred_at, .. }
            | DomainEvent::PortfolioUpdated { occurred_at, .. } => *occurred_at,
        }
    }

    pub fn aggregate_id(&self) -> &str {
        match self {
            DomainEvent::InvestmentCreated { investment_id, .. } => investment_id.as_str(),
            DomainEvent::PortfolioUpdated { portfolio_id, .. } => portfolio_id.as_str(),
        }
    }

    pub fn aggregate_type(&self) -> &'static str {
        match self {
            DomainEvent::InvestmentCreated { .. } => "Investment",
            DomainEvent::PortfolioUpdated { .. } => "Portfolio",
        }
    }
}

/// Storage label of an event. `Unknown` covers labels written by other
/// producers that this build does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    InvestmentCreated,
    PortfolioUpdated,
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::InvestmentCreated => "InvestmentCreated",
            EventKind::PortfolioUpdated => "PortfolioUpdated",
            EventKind::Unknown => "Unknown",
        }
    }
}

impl From<&str> for EventKind {
    fn from(label: &str) -> Self {
        match label {
            "InvestmentCreated" => EventKind::InvestmentCreated,
            "PortfolioUpdated" => EventKind::PortfolioUpdated,
            _ => EventKind::Unknown,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event as recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: String,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub event_type: EventKind,
    pub event_data: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl StoredEvent {
    pub fn from_event(event: &DomainEvent) -> Result<Self> {
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            aggregate_id: event.aggregate_id().to_string(),
            aggregate_type: event.aggregate_type().to_string(),
            event_type: event.kind(),
            event_data: serde_json::to_value(event)?,
            occurred_at: event.occurred_at(),
        })
    }
}

/// Receives published domain events.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &DomainEvent) -> Result<()>;
}

/// Fire-and-forget sink the use cases publish to.
#[async_trait]
pub trait DomainEventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<()>;

    async fn subscribe(&self, listener: Arc<dyn EventListener>);
}

/// Writes every event to the log.
pub struct LoggingListener;

#[async_trait]
impl EventListener for LoggingListener {
    async fn on_event(&self, event: &DomainEvent) -> Result<()> {
        info!(
            "Event {} on {} {}",
            event.kind(),
            event.aggregate_type(),
            event.aggregate_id()
        );
        Ok(())
    }
}
