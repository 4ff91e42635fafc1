pub mod event_bus;
pub mod event_store;
pub mod persistence;
pub mod repositories;

pub use event_bus::EventBus;
pub use event_store::EventStoreListener;
pub use repositories::{
    InMemoryEventRepository, InMemoryInvestmentRepository, InMemoryPortfolioRepository,
    InMemoryTransactionManager,
};
