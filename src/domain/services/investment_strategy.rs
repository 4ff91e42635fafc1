//! Investment Strategy Service
//!
//! Portfolio-wide policy: pre-flight validation of a prospective investment,
//! weighted risk scoring and rebalancing advice.
//!
//! The ceiling and aggressive ratio come from the `portfolio` module so the
//! pre-flight check and the aggregate's own backstop cannot drift apart.

use crate::domain::errors::DomainError;
use crate::domain::investment::{Investment, InvestmentStrategy};
use crate::domain::portfolio::{MAX_AGGRESSIVE_RATIO, MAX_PORTFOLIO_AMOUNT, Portfolio};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Conservative share below which an increase is suggested.
const MIN_CONSERVATIVE_RATIO: Decimal = dec!(0.2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebalancingAction {
    Reduce,
    Increase,
}

impl fmt::Display for RebalancingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalancingAction::Reduce => write!(f, "REDUCE"),
            RebalancingAction::Increase => write!(f, "INCREASE"),
        }
    }
}

/// Advisory action; never applied automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalancingSuggestion {
    pub action: RebalancingAction,
    pub strategy: InvestmentStrategy,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct InvestmentStrategyService {
    max_investment_amount: Decimal,
    max_aggressive_ratio: Decimal,
}

impl Default for InvestmentStrategyService {
    fn default() -> Self {
        Self::new()
    }
}

impl InvestmentStrategyService {
    pub fn new() -> Self {
        Self {
            max_investment_amount: MAX_PORTFOLIO_AMOUNT,
            max_aggressive_ratio: MAX_AGGRESSIVE_RATIO,
        }
    }

    /// Risk weight of a strategy, in [0, 1].
    pub fn risk_weight(strategy: InvestmentStrategy) -> Decimal {
        match strategy {
            InvestmentStrategy::Conservative => dec!(0.2),
            InvestmentStrategy::Moderate => dec!(0.5),
            InvestmentStrategy::Aggressive => dec!(1.0),
        }
    }

    /// Check a prospective investment against portfolio-wide limits before
    /// it is added. The ceiling is checked first.
    pub fn validate_investment_strategy(
        &self,
        investment: &Investment,
        portfolio: &Portfolio,
    ) -> Result<(), DomainError> {
        let amount = investment.amount();
        if let Some(currency) = portfolio.currency()
            && currency != amount.currency()
        {
            return Err(DomainError::CurrencyMismatch {
                left: currency,
                right: amount.currency(),
            });
        }

        let Some(new_total) = portfolio
            .calculate_total_amount()
            .amount()
            .checked_add(amount.amount())
            .filter(|total| *total <= self.max_investment_amount)
        else {
            debug!(
                "Rejecting investment {}: total would exceed {}",
                investment.id(),
                self.max_investment_amount
            );
            return Err(DomainError::PortfolioLimitExceeded);
        };

        if investment.strategy() == InvestmentStrategy::Aggressive && !new_total.is_zero() {
            let new_aggressive = portfolio
                .calculate_strategy_amount(InvestmentStrategy::Aggressive)
                .amount()
                .checked_add(amount.amount())
                .ok_or(DomainError::PortfolioLimitExceeded)?;
            let ratio = new_aggressive / new_total;
            if ratio > self.max_aggressive_ratio {
                debug!(
                    "Rejecting investment {}: aggressive ratio {} exceeds {}",
                    investment.id(),
                    ratio,
                    self.max_aggressive_ratio
                );
                return Err(DomainError::AggressiveInvestmentLimitExceeded);
            }
        }

        Ok(())
    }

    /// Weighted average of strategy risk weights by share of the total.
    /// Zero for an empty portfolio.
    pub fn calculate_risk_score(&self, portfolio: &Portfolio) -> f64 {
        let total = portfolio.calculate_total_amount().amount();
        if total.is_zero() {
            return 0.0;
        }

        let score: Decimal = portfolio
            .investments()
            .iter()
            .map(|i| i.amount().amount() / total * Self::risk_weight(i.strategy()))
            .sum();

        score.to_f64().unwrap_or(0.0)
    }

    pub fn suggest_rebalancing(&self, portfolio: &Portfolio) -> Vec<RebalancingSuggestion> {
        let mut suggestions = Vec::new();
        let allocation = portfolio.strategy_allocation();
        if allocation.is_empty() {
            return suggestions;
        }

        let share = |strategy: InvestmentStrategy| {
            allocation
                .get(&strategy)
                .copied()
                .unwrap_or(Decimal::ZERO)
        };

        if share(InvestmentStrategy::Aggressive) > self.max_aggressive_ratio {
            suggestions.push(RebalancingSuggestion {
                action: RebalancingAction::Reduce,
                strategy: InvestmentStrategy::Aggressive,
                reason: "Aggressive allocation exceeds recommended maximum".to_string(),
            });
        }

        if share(InvestmentStrategy::Conservative) < MIN_CONSERVATIVE_RATIO {
            suggestions.push(RebalancingSuggestion {
                action: RebalancingAction::Increase,
                strategy: InvestmentStrategy::Conservative,
                reason: "Conservative allocation below recommended minimum".to_string(),
            });
        }

        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::investment::{InvestmentId, InvestmentType};
    use crate::domain::money::{Currency, Money};
    use crate::domain::portfolio::PortfolioId;

    fn investment(id: &str, amount: Decimal, strategy: InvestmentStrategy) -> Investment {
        Investment::new(
            InvestmentId::new(id),
            Money::new(amount, Currency::Jpy).unwrap(),
            InvestmentType::Stock,
            strategy,
        )
    }

    fn portfolio_with(investments: Vec<Investment>) -> Portfolio {
        let mut portfolio = Portfolio::new(PortfolioId::new("p-1"), "user-1");
        for inv in investments {
            portfolio.add_investment(inv).unwrap();
        }
        portfolio
    }

    #[test]
    fn test_validate_accepts_within_limits() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![investment(
            "a",
            dec!(1000000),
            InvestmentStrategy::Conservative,
        )]);

        let candidate = investment("b", dec!(1000000), InvestmentStrategy::Aggressive);
        assert!(
            service
                .validate_investment_strategy(&candidate, &portfolio)
                .is_ok()
        );
    }

    #[test]
    fn test_validate_rejects_total_over_ceiling() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![investment(
            "a",
            dec!(9000000),
            InvestmentStrategy::Conservative,
        )]);

        let candidate = investment("b", dec!(2000000), InvestmentStrategy::Moderate);
        assert_eq!(
            service.validate_investment_strategy(&candidate, &portfolio),
            Err(DomainError::PortfolioLimitExceeded)
        );
    }

    #[test]
    fn test_validate_rejects_aggressive_ratio_within_ceiling() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![investment(
            "a",
            dec!(1000000),
            InvestmentStrategy::Conservative,
        )]);

        // 1.5M / 2.5M = 0.6
        let candidate = investment("b", dec!(1500000), InvestmentStrategy::Aggressive);
        assert_eq!(
            service.validate_investment_strategy(&candidate, &portfolio),
            Err(DomainError::AggressiveInvestmentLimitExceeded)
        );
    }

    #[test]
    fn test_validate_ceiling_masks_aggressive_ratio() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![investment(
            "a",
            dec!(1000000),
            InvestmentStrategy::Conservative,
        )]);

        // Breaks both rules; the ceiling wins.
        let candidate = investment("b", dec!(9500000), InvestmentStrategy::Aggressive);
        assert_eq!(
            service.validate_investment_strategy(&candidate, &portfolio),
            Err(DomainError::PortfolioLimitExceeded)
        );
    }

    #[test]
    fn test_validate_largest_amount_rejected_without_overflow() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![investment(
            "a",
            dec!(1),
            InvestmentStrategy::Conservative,
        )]);

        for strategy in [InvestmentStrategy::Moderate, InvestmentStrategy::Aggressive] {
            let candidate = investment("b", Decimal::MAX, strategy);
            assert_eq!(
                service.validate_investment_strategy(&candidate, &portfolio),
                Err(DomainError::PortfolioLimitExceeded)
            );
        }
    }

    #[test]
    fn test_validate_first_aggressive_into_empty_portfolio() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![]);

        // 100% aggressive
        let candidate = investment("a", dec!(100), InvestmentStrategy::Aggressive);
        assert_eq!(
            service.validate_investment_strategy(&candidate, &portfolio),
            Err(DomainError::AggressiveInvestmentLimitExceeded)
        );

        let zero = investment("z", dec!(0), InvestmentStrategy::Aggressive);
        assert!(service.validate_investment_strategy(&zero, &portfolio).is_ok());
    }

    #[test]
    fn test_validate_rejects_other_currency() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![investment(
            "a",
            dec!(100),
            InvestmentStrategy::Moderate,
        )]);
        let candidate = Investment::new(
            InvestmentId::new("b"),
            Money::new(dec!(100), Currency::Usd).unwrap(),
            InvestmentType::Bond,
            InvestmentStrategy::Moderate,
        );

        assert!(matches!(
            service.validate_investment_strategy(&candidate, &portfolio),
            Err(DomainError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_risk_score_empty() {
        let service = InvestmentStrategyService::new();
        assert_eq!(service.calculate_risk_score(&portfolio_with(vec![])), 0.0);
    }

    #[test]
    fn test_risk_score_single_conservative() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![investment(
            "a",
            dec!(5000),
            InvestmentStrategy::Conservative,
        )]);
        assert!((service.calculate_risk_score(&portfolio) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_risk_score_equal_thirds() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![
            investment("a", dec!(1000), InvestmentStrategy::Conservative),
            investment("b", dec!(1000), InvestmentStrategy::Moderate),
            investment("c", dec!(1000), InvestmentStrategy::Aggressive),
        ]);

        let score = service.calculate_risk_score(&portfolio);
        assert!((score - 0.5667).abs() < 0.001, "score was {}", score);
    }

    #[test]
    fn test_rebalancing_heavy_aggressive() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![
            investment("a", dec!(7000), InvestmentStrategy::Aggressive),
            investment("b", dec!(2000), InvestmentStrategy::Moderate),
            investment("c", dec!(1000), InvestmentStrategy::Conservative),
        ]);

        let suggestions = service.suggest_rebalancing(&portfolio);
        assert!(suggestions.iter().any(|s| s.action == RebalancingAction::Reduce
            && s.strategy == InvestmentStrategy::Aggressive));
        // 10% conservative also triggers an increase
        assert!(suggestions.iter().any(|s| s.action == RebalancingAction::Increase
            && s.strategy == InvestmentStrategy::Conservative));
    }

    #[test]
    fn test_rebalancing_balanced_portfolio() {
        let service = InvestmentStrategyService::new();
        let portfolio = portfolio_with(vec![
            investment("a", dec!(3000), InvestmentStrategy::Aggressive),
            investment("b", dec!(4000), InvestmentStrategy::Moderate),
            investment("c", dec!(3000), InvestmentStrategy::Conservative),
        ]);

        assert!(service.suggest_rebalancing(&portfolio).is_empty());
    }

    #[test]
    fn test_rebalancing_empty_portfolio() {
        let service = InvestmentStrategyService::new();
        assert!(service.suggest_rebalancing(&portfolio_with(vec![])).is_empty());
    }
}
