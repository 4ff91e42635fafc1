//! Wiring of the persistence layer, event bus and use cases.

pub mod persistence;
pub mod services;

pub use persistence::{PersistenceBootstrap, PersistenceHandle};
pub use services::{ServicesBootstrap, ServicesHandle};
