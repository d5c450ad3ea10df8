//! FX engine error types.

use chrono::NaiveDate;
use ledgerfx_common::{CommonError, Currency, CurrencyPair};
use thiserror::Error;

/// Errors that can occur in the FX engine.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// The rate source could not be read.
    #[error("Rate source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// No rate within the lookback window, directly or via the reference currency.
    #[error("{}", not_found_message(.pair, .date, .triangulated))]
    RateNotFound {
        pair: CurrencyPair,
        date: NaiveDate,
        triangulated: bool,
    },

    /// Requested date could not be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Currency code could not be parsed.
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Engine configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A resolved rate is infinite or NaN and cannot price an amount.
    #[error("Non-finite rate for {pair} on {date}")]
    NonFiniteRate { pair: CurrencyPair, date: NaiveDate },

    /// A converted amount or a sum of amounts left the decimal range.
    #[error("Amount overflow in {currency} on {date}")]
    AmountOverflow { currency: Currency, date: NaiveDate },
}

fn not_found_message(pair: &CurrencyPair, date: &NaiveDate, triangulated: &bool) -> String {
    if *triangulated {
        format!("FX rate not found for {pair} on {date} (including reference currency variant)")
    } else {
        format!("FX rate not found for {pair} on {date}")
    }
}

impl FxError {
    /// Stable code for logs and callers that match on strings.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            FxError::RateNotFound { .. } => "RATE_NOT_FOUND",
            FxError::InvalidDate(_) => "INVALID_DATE",
            FxError::InvalidCurrency(_) => "INVALID_CURRENCY",
            FxError::InvalidConfig(_) => "INVALID_CONFIG",
            FxError::NonFiniteRate { .. } => "NON_FINITE_RATE",
            FxError::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
        }
    }

    /// True for a lookup that simply had no data, as opposed to a broken source or input.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FxError::RateNotFound { .. })
    }
}

impl From<CommonError> for FxError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::InvalidDate(text) => FxError::InvalidDate(text),
            CommonError::InvalidCurrency(code) => FxError::InvalidCurrency(code),
            other => FxError::InvalidConfig(other.to_string()),
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_mentions_fallback() {
        let date = NaiveDate::from_ymd_opt(2023, 2, 15).unwrap();
        let pair = CurrencyPair::new(Currency::jpy(), Currency::chf());

        let direct = FxError::RateNotFound {
            pair: pair.clone(),
            date,
            triangulated: false,
        };
        assert_eq!(direct.to_string(), "FX rate not found for JPY/CHF on 2023-02-15");

        let via_usd = FxError::RateNotFound {
            pair,
            date,
            triangulated: true,
        };
        assert!(via_usd.to_string().ends_with("(including reference currency variant)"));
        assert_eq!(via_usd.error_code(), "RATE_NOT_FOUND");
        assert!(via_usd.is_not_found());
    }

    #[test]
    fn test_common_error_conversion() {
        let err: FxError = CommonError::InvalidDate("yesterday".into()).into();
        assert!(matches!(err, FxError::InvalidDate(ref s) if s == "yesterday"));
    }
}
