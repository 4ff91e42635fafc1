// Stateless policy services layered above the aggregates
pub mod investment_strategy;

pub use investment_strategy::{
    InvestmentStrategyService, RebalancingAction, RebalancingSuggestion,
};
