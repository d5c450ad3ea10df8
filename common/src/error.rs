//! Error types for shared value types.

use crate::Currency;
use thiserror::Error;

/// Errors raised while parsing or combining shared value types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Date text without a leading `YYYY-MM-DD`.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Currency code that is empty or not alphabetic.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Arithmetic across two different currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    /// Arithmetic result outside the decimal range.
    #[error("Amount overflow in {0}")]
    AmountOverflow(Currency),
}

/// Result type alias for shared value operations.
pub type Result<T> = std::result::Result<T, CommonError>;
