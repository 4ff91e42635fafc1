pub mod in_memory;

pub use in_memory::{
    InMemoryEventRepository, InMemoryInvestmentRepository, InMemoryPortfolioRepository,
    InMemoryTransactionManager,
};
