//! Currency-tagged monetary amounts.

use crate::domain::errors::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies accepted by the bookkeeping domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Jpy,
    Usd,
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Jpy => "JPY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JPY" => Ok(Currency::Jpy),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "" => Err(DomainError::invalid_amount("currency is required")),
            other => Err(DomainError::invalid_amount(format!(
                "unsupported currency code: {}",
                other
            ))),
        }
    }
}

/// Immutable non-negative amount in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::invalid_amount(format!(
                "amount cannot be negative: {}",
                amount
            )));
        }
        Ok(Self { amount, currency })
    }

    /// Build from a raw currency code, rejecting empty or unsupported codes.
    pub fn parse(amount: Decimal, currency_code: &str) -> Result<Self, DomainError> {
        let currency = Currency::from_str(currency_code)?;
        Self::new(amount, currency)
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        self.ensure_same_currency(other)?;
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::invalid_amount("amount overflow"))?;
        Money::new(sum, self.currency)
    }

    pub fn subtract(&self, other: &Money) -> Result<Money, DomainError> {
        self.ensure_same_currency(other)?;
        Money::new(self.amount - other.amount, self.currency)
    }

    pub fn multiply(&self, factor: Decimal) -> Result<Money, DomainError> {
        let product = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| DomainError::invalid_amount("amount overflow"))?;
        Money::new(product, self.currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Cross-currency comparisons are always false.
    pub fn is_greater_than(&self, other: &Money) -> bool {
        self.currency == other.currency && self.amount > other.amount
    }

    /// Cross-currency comparisons are always false.
    pub fn is_less_than(&self, other: &Money) -> bool {
        self.currency == other.currency && self.amount < other.amount
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
