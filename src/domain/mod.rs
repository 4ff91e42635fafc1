// Money and currency value objects
pub mod money;

// Investment entity
pub mod investment;

// Portfolio aggregate
pub mod portfolio;

// Domain events
pub mod events;

// Repository traits
pub mod repositories;

// Policy services
pub mod services;

// Domain-specific error types
pub mod errors;
