use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identity of an investment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestmentId(String);

impl InvestmentId {
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

impl fmt::Display for InvestmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentType {
    Stock,
    Bond,
    RealEstate,
}

impl fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentType::Stock => write!(f, "STOCK"),
            InvestmentType::Bond => write!(f, "BOND"),
            InvestmentType::RealEstate => write!(f, "REAL_ESTATE"),
        }
    }
}

impl FromStr for InvestmentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOCK" => Ok(InvestmentType::Stock),
            "BOND" => Ok(InvestmentType::Bond),
            "REAL_ESTATE" => Ok(InvestmentType::RealEstate),
            _ => Err(DomainError::InvalidInvestmentType {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvestmentStrategy {
    Conservative,
    Moderate,
    Aggressive,
}

impl InvestmentStrategy {
    pub const ALL: [InvestmentStrategy; 3] = [
        InvestmentStrategy::Conservative,
        InvestmentStrategy::Moderate,
        InvestmentStrategy::Aggressive,
    ];
}

impl fmt::Display for InvestmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentStrategy::Conservative => write!(f, "CONSERVATIVE"),
            InvestmentStrategy::Moderate => write!(f, "MODERATE"),
            InvestmentStrategy::Aggressive => write!(f, "AGGRESSIVE"),
        }
    }
}

impl FromStr for InvestmentStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONSERVATIVE" => Ok(InvestmentStrategy::Conservative),
            "MODERATE" => Ok(InvestmentStrategy::Moderate),
            "AGGRESSIVE" => Ok(InvestmentStrategy::Aggressive),
            _ => Err(DomainError::InvalidInvestmentStrategy {
                value: s.to_string(),
            }),
        }
    }
}

/// A single allocation of money to a type/strategy pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Investment {
    id: InvestmentId,
    amount: Money,
    investment_type: InvestmentType,
    strategy: InvestmentStrategy,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Investment {
    pub fn new(
        id: InvestmentId,
        amount: Money,
        investment_type: InvestmentType,
        strategy: InvestmentStrategy,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            amount,
            investment_type,
            strategy,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validating constructor for raw type/strategy labels.
    pub fn create(
        id: InvestmentId,
        amount: Money,
        investment_type: &str,
        strategy: &str,
    ) -> Result<Self, DomainError> {
        let investment_type = InvestmentType::from_str(investment_type)?;
        let strategy = InvestmentStrategy::from_str(strategy)?;
        Ok(Self::new(id, amount, investment_type, strategy))
    }

    /// Rebuild a persisted investment, keeping its stored timestamps.
    pub fn restore(
        id: InvestmentId,
        amount: Money,
        investment_type: InvestmentType,
        strategy: InvestmentStrategy,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            amount,
            investment_type,
            strategy,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &InvestmentId {
        &self.id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn investment_type(&self) -> InvestmentType {
        self.investment_type
    }

    pub fn strategy(&self) -> InvestmentStrategy {
        self.strategy
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the amount and refresh `updated_at`.
    ///
    /// No portfolio-level checks happen here; contained investments are
    /// updated through `Portfolio::update_investment_amount`.
    pub fn update_amount(&mut self, new_amount: Money) {
        self.amount = new_amount;
        self.updated_at = Utc::now();
    }
}
