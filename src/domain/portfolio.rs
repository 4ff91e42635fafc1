//! Portfolio aggregate.
//!
//! A `Portfolio` exclusively owns its investments and is the consistency
//! boundary for them: every mutation goes through the aggregate, which
//! validates before touching any state.
//!
//! Invariants held after every successful mutation:
//! - investment ids are unique,
//! - all investments share one currency,
//! - the total amount stays at or below [`MAX_PORTFOLIO_AMOUNT`].
//!
//! The aggressive ratio ([`MAX_AGGRESSIVE_RATIO`]) is checked on demand by
//! [`Portfolio::validate_risk_distribution`].

use crate::domain::errors::DomainError;
use crate::domain::investment::{Investment, InvestmentId, InvestmentStrategy};
use crate::domain::money::{Currency, Money};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Ceiling on the total value of a portfolio, in the base currency unit.
pub const MAX_PORTFOLIO_AMOUNT: Decimal = dec!(10000000);

/// Maximum share of the total that may sit in aggressive investments.
pub const MAX_AGGRESSIVE_RATIO: Decimal = dec!(0.5);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioId(String);

impl PortfolioId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    id: PortfolioId,
    user_id: String,
    investments: HashMap<InvestmentId, Investment>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(id: PortfolioId, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: user_id.into(),
            investments: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a persisted portfolio. Contained investments go through the
    /// same checks as `add_investment`, so a corrupt store surfaces as an error.
    pub fn restore(
        id: PortfolioId,
        user_id: impl Into<String>,
        investments: Vec<Investment>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut portfolio = Self::new(id, user_id);
        for investment in investments {
            portfolio.add_investment(investment)?;
        }
        portfolio.created_at = created_at;
        portfolio.updated_at = updated_at;
        Ok(portfolio)
    }

    pub fn id(&self) -> &PortfolioId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn len(&self) -> usize {
        self.investments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.investments.is_empty()
    }

    /// Currency shared by every contained investment, `None` when empty.
    pub fn currency(&self) -> Option<Currency> {
        self.investments.values().next().map(|i| i.amount().currency())
    }

    pub fn add_investment(&mut self, investment: Investment) -> Result<(), DomainError> {
        if self.investments.contains_key(investment.id()) {
            return Err(DomainError::DuplicateInvestment {
                id: investment.id().to_string(),
            });
        }

        let amount = investment.amount();
        self.ensure_currency(amount.currency())?;

        let new_total = self
            .total_value()
            .checked_add(amount.amount())
            .ok_or(DomainError::PortfolioLimitExceeded)?;
        if new_total > MAX_PORTFOLIO_AMOUNT {
            return Err(DomainError::PortfolioLimitExceeded);
        }

        self.investments.insert(investment.id().clone(), investment);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn remove_investment(&mut self, id: &InvestmentId) -> Result<Investment, DomainError> {
        let removed = self
            .investments
            .remove(id)
            .ok_or_else(|| DomainError::InvestmentNotFound { id: id.to_string() })?;
        self.updated_at = Utc::now();
        Ok(removed)
    }

    /// Change the amount of a contained investment.
    ///
    /// Re-applies the currency and ceiling checks of `add_investment`. The
    /// aggressive ratio is left to `validate_risk_distribution`.
    pub fn update_investment_amount(
        &mut self,
        id: &InvestmentId,
        new_amount: Money,
    ) -> Result<(), DomainError> {
        let current = self
            .investments
            .get(id)
            .map(|i| i.amount())
            .ok_or_else(|| DomainError::InvestmentNotFound { id: id.to_string() })?;

        if current.currency() != new_amount.currency() {
            return Err(DomainError::CurrencyMismatch {
                left: current.currency(),
                right: new_amount.currency(),
            });
        }

        // An overflowing sum is necessarily above the ceiling
        let new_total = (self.total_value() - current.amount())
            .checked_add(new_amount.amount())
            .ok_or(DomainError::PortfolioLimitExceeded)?;
        if new_total > MAX_PORTFOLIO_AMOUNT {
            return Err(DomainError::PortfolioLimitExceeded);
        }

        if let Some(investment) = self.investments.get_mut(id) {
            investment.update_amount(new_amount);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn get_investment(&self, id: &InvestmentId) -> Result<&Investment, DomainError> {
        self.investments
            .get(id)
            .ok_or_else(|| DomainError::InvestmentNotFound { id: id.to_string() })
    }

    /// Snapshot of all investments. Order is unspecified.
    pub fn investments(&self) -> Vec<&Investment> {
        self.investments.values().collect()
    }

    /// Sum of all investments in the portfolio currency (default currency
    /// with a zero amount when empty).
    pub fn calculate_total_amount(&self) -> Money {
        Money::new(self.total_value(), self.currency().unwrap_or_default())
            .unwrap_or_else(|_| Money::zero(self.currency().unwrap_or_default()))
    }

    pub fn calculate_strategy_amount(&self, strategy: InvestmentStrategy) -> Money {
        let currency = self.currency().unwrap_or_default();
        Money::new(self.strategy_value(strategy), currency)
            .unwrap_or_else(|_| Money::zero(currency))
    }

    /// Fraction of the total held by each strategy present in the portfolio.
    pub fn strategy_allocation(&self) -> HashMap<InvestmentStrategy, Decimal> {
        let total = self.total_value();
        let mut allocation = HashMap::new();
        if total.is_zero() {
            return allocation;
        }

        for investment in self.investments.values() {
            *allocation
                .entry(investment.strategy())
                .or_insert(Decimal::ZERO) += investment.amount().amount() / total;
        }
        allocation
    }

    pub fn validate_risk_distribution(&self) -> Result<(), DomainError> {
        let total = self.total_value();
        if total.is_zero() {
            return Ok(());
        }

        let aggressive = self.strategy_value(InvestmentStrategy::Aggressive);
        if aggressive / total > MAX_AGGRESSIVE_RATIO {
            return Err(DomainError::AggressiveInvestmentLimitExceeded);
        }
        Ok(())
    }

    fn ensure_currency(&self, incoming: Currency) -> Result<(), DomainError> {
        match self.currency() {
            Some(existing) if existing != incoming => Err(DomainError::CurrencyMismatch {
                left: existing,
                right: incoming,
            }),
            _ => Ok(()),
        }
    }

    fn total_value(&self) -> Decimal {
        self.investments.values().map(|i| i.amount().amount()).sum()
    }

    fn strategy_value(&self, strategy: InvestmentStrategy) -> Decimal {
        self.investments
            .values()
            .filter(|i| i.strategy() == strategy)
            .map(|i| i.amount().amount())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::investment::InvestmentType;
    use rust_decimal_macros::dec;

    fn investment(id: &str, amount: Decimal, strategy: InvestmentStrategy) -> Investment {
        Investment::new(
            InvestmentId::new(id),
            Money::new(amount, Currency::Jpy).unwrap(),
            InvestmentType::Stock,
            strategy,
        )
    }

    fn portfolio() -> Portfolio {
        Portfolio::new(PortfolioId::new("p-1"), "user-1")
    }

    #[test]
    fn test_add_then_limit_then_duplicate() {
        let mut p = portfolio();

        p.add_investment(investment(
            "inv-1",
            dec!(1000000),
            InvestmentStrategy::Conservative,
        ))
        .unwrap();

        let err = p
            .add_investment(investment(
                "inv-2",
                dec!(11000000),
                InvestmentStrategy::Conservative,
            ))
            .unwrap_err();
        assert_eq!(err, DomainError::PortfolioLimitExceeded);

        let err = p
            .add_investment(investment(
                "inv-1",
                dec!(500),
                InvestmentStrategy::Conservative,
            ))
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_INVESTMENT");

        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_limit_is_inclusive() {
        let mut p = portfolio();
        p.add_investment(investment(
            "a",
            dec!(6000000),
            InvestmentStrategy::Moderate,
        ))
        .unwrap();
        p.add_investment(investment(
            "b",
            dec!(4000000),
            InvestmentStrategy::Moderate,
        ))
        .unwrap();
        assert_eq!(p.calculate_total_amount().amount(), MAX_PORTFOLIO_AMOUNT);

        let err = p
            .add_investment(investment("c", dec!(0.01), InvestmentStrategy::Moderate))
            .unwrap_err();
        assert_eq!(err, DomainError::PortfolioLimitExceeded);
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_largest_amount_rejected_without_overflow() {
        let mut p = portfolio();
        p.add_investment(investment("a", dec!(1), InvestmentStrategy::Moderate))
            .unwrap();

        let err = p
            .add_investment(investment("b", Decimal::MAX, InvestmentStrategy::Moderate))
            .unwrap_err();
        assert_eq!(err, DomainError::PortfolioLimitExceeded);

        p.add_investment(investment("c", dec!(2), InvestmentStrategy::Moderate))
            .unwrap();
        let err = p
            .update_investment_amount(
                &InvestmentId::new("a"),
                Money::new(Decimal::MAX, Currency::Jpy).unwrap(),
            )
            .unwrap_err();
        assert_eq!(err, DomainError::PortfolioLimitExceeded);

        assert_eq!(p.len(), 2);
        assert_eq!(p.calculate_total_amount().amount(), dec!(3));
    }

    #[test]
    fn test_mixed_currency_rejected() {
        let mut p = portfolio();
        p.add_investment(investment("a", dec!(100), InvestmentStrategy::Moderate))
            .unwrap();

        let usd = Investment::new(
            InvestmentId::new("b"),
            Money::new(dec!(100), Currency::Usd).unwrap(),
            InvestmentType::Bond,
            InvestmentStrategy::Moderate,
        );
        let err = p.add_investment(usd).unwrap_err();
        assert!(matches!(err, DomainError::CurrencyMismatch { .. }));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_remove_and_get() {
        let mut p = portfolio();
        p.add_investment(investment("a", dec!(100), InvestmentStrategy::Moderate))
            .unwrap();

        let id = InvestmentId::new("a");
        assert_eq!(p.get_investment(&id).unwrap().amount().amount(), dec!(100));

        let removed = p.remove_investment(&id).unwrap();
        assert_eq!(removed.id(), &id);
        assert!(p.is_empty());

        assert!(matches!(
            p.remove_investment(&id),
            Err(DomainError::InvestmentNotFound { .. })
        ));
        assert!(matches!(
            p.get_investment(&id),
            Err(DomainError::InvestmentNotFound { .. })
        ));
    }

    #[test]
    fn test_totals() {
        let mut p = portfolio();
        let empty_total = p.calculate_total_amount();
        assert!(empty_total.is_zero());
        assert_eq!(empty_total.currency(), Currency::Jpy);

        p.add_investment(investment("a", dec!(100), InvestmentStrategy::Aggressive))
            .unwrap();
        p.add_investment(investment("b", dec!(300), InvestmentStrategy::Conservative))
            .unwrap();
        p.add_investment(investment("c", dec!(50), InvestmentStrategy::Aggressive))
            .unwrap();

        assert_eq!(p.calculate_total_amount().amount(), dec!(450));
        assert_eq!(
            p.calculate_strategy_amount(InvestmentStrategy::Aggressive)
                .amount(),
            dec!(150)
        );
        assert!(
            p.calculate_strategy_amount(InvestmentStrategy::Moderate)
                .is_zero()
        );
        assert_eq!(p.investments().len(), 3);
    }

    #[test]
    fn test_strategy_allocation() {
        let mut p = portfolio();
        assert!(p.strategy_allocation().is_empty());

        p.add_investment(investment("a", dec!(250), InvestmentStrategy::Aggressive))
            .unwrap();
        p.add_investment(investment("b", dec!(750), InvestmentStrategy::Conservative))
            .unwrap();

        let allocation = p.strategy_allocation();
        assert_eq!(allocation[&InvestmentStrategy::Aggressive], dec!(0.25));
        assert_eq!(allocation[&InvestmentStrategy::Conservative], dec!(0.75));
        assert!(!allocation.contains_key(&InvestmentStrategy::Moderate));
    }

    #[test]
    fn test_risk_distribution() {
        let mut p = portfolio();
        assert!(p.validate_risk_distribution().is_ok());

        p.add_investment(investment("a", dec!(500), InvestmentStrategy::Aggressive))
            .unwrap();
        p.add_investment(investment("b", dec!(500), InvestmentStrategy::Moderate))
            .unwrap();
        // Exactly half is allowed
        assert!(p.validate_risk_distribution().is_ok());

        // add_investment does not check the ratio
        p.add_investment(investment("c", dec!(1), InvestmentStrategy::Aggressive))
            .unwrap();
        assert_eq!(
            p.validate_risk_distribution(),
            Err(DomainError::AggressiveInvestmentLimitExceeded)
        );
    }

    #[test]
    fn test_update_investment_amount() {
        let mut p = portfolio();
        p.add_investment(investment("a", dec!(9000000), InvestmentStrategy::Moderate))
            .unwrap();
        p.add_investment(investment("b", dec!(500000), InvestmentStrategy::Moderate))
            .unwrap();

        let id = InvestmentId::new("b");
        p.update_investment_amount(&id, Money::new(dec!(1000000), Currency::Jpy).unwrap())
            .unwrap();
        assert_eq!(p.calculate_total_amount().amount(), MAX_PORTFOLIO_AMOUNT);

        let err = p
            .update_investment_amount(&id, Money::new(dec!(1000001), Currency::Jpy).unwrap())
            .unwrap_err();
        assert_eq!(err, DomainError::PortfolioLimitExceeded);

        let err = p
            .update_investment_amount(&id, Money::new(dec!(1), Currency::Eur).unwrap())
            .unwrap_err();
        assert!(matches!(err, DomainError::CurrencyMismatch { .. }));

        let err = p
            .update_investment_amount(
                &InvestmentId::new("missing"),
                Money::new(dec!(1), Currency::Jpy).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvestmentNotFound { .. }));

        // Failed updates leave the amount untouched
        assert_eq!(
            p.get_investment(&id).unwrap().amount().amount(),
            dec!(1000000)
        );
    }

    #[test]
    fn test_restore_keeps_timestamps_and_checks_invariants() {
        let created = Utc::now() - chrono::Duration::days(3);
        let updated = Utc::now() - chrono::Duration::days(1);

        let restored = Portfolio::restore(
            PortfolioId::new("p-9"),
            "user-9",
            vec![investment("a", dec!(10), InvestmentStrategy::Moderate)],
            created,
            updated,
        )
        .unwrap();
        assert_eq!(restored.created_at(), created);
        assert_eq!(restored.updated_at(), updated);
        assert_eq!(restored.len(), 1);

        let err = Portfolio::restore(
            PortfolioId::new("p-9"),
            "user-9",
            vec![
                investment("a", dec!(10), InvestmentStrategy::Moderate),
                investment("a", dec!(20), InvestmentStrategy::Moderate),
            ],
            created,
            updated,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateInvestment { .. }));
    }
}
