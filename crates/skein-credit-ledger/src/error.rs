//! Error types for the credit ledger

use thiserror::Error;

use crate::amount::Credits;

/// Result type alias using CreditError
pub type Result<T> = std::result::Result<T, CreditError>;

/// Errors from balance-affecting operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CreditError {
    /// A deduction would drive the balance below zero.
    ///
    /// Carries both sides so callers can show the shortfall.
    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits {
        required: Credits,
        available: Credits,
    },

    /// Deductions and additions must carry a strictly positive amount
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Credits, reason: String },

    /// Arithmetic overflow on a balance update
    #[error("balance overflow for user '{0}'")]
    BalanceOverflow(String),
}

impl CreditError {
    /// Create an invalid-amount error
    pub fn invalid_amount(amount: Credits, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            amount,
            reason: reason.into(),
        }
    }

    /// The missing amount on an insufficient-credits failure
    pub fn shortfall(&self) -> Option<Credits> {
        match self {
            Self::InsufficientCredits {
                required,
                available,
            } => required.checked_sub(*available),
            _ => None,
        }
    }
}
