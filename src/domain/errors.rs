use thiserror::Error;

use crate::domain::money::Currency;

/// Typed faults raised by the portfolio domain.
///
/// Every variant carries a stable code so callers can branch on the kind
/// without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("INVALID_INVESTMENT_AMOUNT: {reason}")]
    InvalidInvestmentAmount { reason: String },

    #[error("INVALID_INVESTMENT_TYPE: investment type '{value}' is invalid")]
    InvalidInvestmentType { value: String },

    #[error("INVALID_INVESTMENT_STRATEGY: investment strategy '{value}' is invalid")]
    InvalidInvestmentStrategy { value: String },

    #[error("PORTFOLIO_LIMIT_EXCEEDED: portfolio total amount would exceed maximum limit")]
    PortfolioLimitExceeded,

    #[error("INVESTMENT_NOT_FOUND: investment {id} not found in portfolio")]
    InvestmentNotFound { id: String },

    #[error("AGGRESSIVE_INVESTMENT_LIMIT_EXCEEDED: aggressive investments exceed maximum allowed ratio")]
    AggressiveInvestmentLimitExceeded,

    #[error("DUPLICATE_INVESTMENT: investment {id} already exists in portfolio")]
    DuplicateInvestment { id: String },

    #[error("CURRENCY_MISMATCH: {left} and {right} cannot be combined")]
    CurrencyMismatch { left: Currency, right: Currency },

    #[error("NOT_FOUND: {entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("INVALID_INPUT: {reason}")]
    InvalidInput { reason: String },

    #[error("UNAUTHORIZED: {reason}")]
    Unauthorized { reason: String },

    #[error("INTERNAL: {reason}")]
    Internal { reason: String },
}

impl DomainError {
    /// Stable machine-readable code of the fault.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidInvestmentAmount { .. } => "INVALID_INVESTMENT_AMOUNT",
            DomainError::InvalidInvestmentType { .. } => "INVALID_INVESTMENT_TYPE",
            DomainError::InvalidInvestmentStrategy { .. } => "INVALID_INVESTMENT_STRATEGY",
            DomainError::PortfolioLimitExceeded => "PORTFOLIO_LIMIT_EXCEEDED",
            DomainError::InvestmentNotFound { .. } => "INVESTMENT_NOT_FOUND",
            DomainError::AggressiveInvestmentLimitExceeded => {
                "AGGRESSIVE_INVESTMENT_LIMIT_EXCEEDED"
            }
            DomainError::DuplicateInvestment { .. } => "DUPLICATE_INVESTMENT",
            DomainError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            DomainError::NotFound { .. } => "NOT_FOUND",
            DomainError::InvalidInput { .. } => "INVALID_INPUT",
            DomainError::Unauthorized { .. } => "UNAUTHORIZED",
            DomainError::Internal { .. } => "INTERNAL",
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        DomainError::InvalidInvestmentAmount {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_starts_with_code() {
        let errors = vec![
            DomainError::PortfolioLimitExceeded,
            DomainError::AggressiveInvestmentLimitExceeded,
            DomainError::DuplicateInvestment {
                id: "inv-1".to_string(),
            },
            DomainError::CurrencyMismatch {
                left: Currency::Jpy,
                right: Currency::Usd,
            },
            DomainError::not_found("portfolio", "p-1"),
        ];

        for error in errors {
            let msg = error.to_string();
            assert!(
                msg.starts_with(error.code()),
                "'{}' should start with {}",
                msg,
                error.code()
            );
        }
    }

    #[test]
    fn test_not_found_formatting() {
        let error = DomainError::not_found("investment", "abc");
        let msg = error.to_string();
        assert!(msg.contains("investment"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_currency_mismatch_formatting() {
        let error = DomainError::CurrencyMismatch {
            left: Currency::Eur,
            right: Currency::Jpy,
        };
        let msg = error.to_string();
        assert!(msg.contains("EUR"));
        assert!(msg.contains("JPY"));
    }
}
