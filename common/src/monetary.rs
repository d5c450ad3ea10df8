//! Monetary types shared by the rate engine and its callers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::error::CommonError;

/// ISO 4217 style currency code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Parse a currency code, rejecting empty or non-alphabetic input.
    pub fn parse(code: &str) -> Result<Self, CommonError> {
        let trimmed = code.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CommonError::InvalidCurrency(code.to_string()));
        }
        Ok(Self::new(trimmed))
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" => 0,
            "BHD" | "KWD" | "OMR" => 3,
            _ => 2,
        }
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }

    pub fn chf() -> Self {
        Self::new("CHF")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An ordered currency pair.
///
/// A rate quoted for the pair converts `base` into `quote`:
/// `amount_in_quote = amount_in_base * rate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub base: Currency,
    /// Currency being converted into.
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }

    /// True when both sides are the same currency.
    pub fn is_identity(&self) -> bool {
        self.base == self.quote
    }

    /// True when either side is `currency`.
    pub fn involves(&self, currency: &Currency) -> bool {
        &self.base == currency || &self.quote == currency
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A monetary amount with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount value (high precision decimal).
    pub value: Decimal,
    /// Currency the value is denominated in.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money instance.
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Create from a string value.
    pub fn from_str(value: &str, currency: Currency) -> Result<Self, rust_decimal::Error> {
        Ok(Self {
            value: value.parse()?,
            currency,
        })
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            value: Decimal::ZERO,
            currency,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Round to the currency's standard decimal places.
    pub fn round(&self) -> Self {
        let places = self.currency.decimal_places();
        Self {
            value: self.value.round_dp(places),
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

impl Add for Money {
    type Output = Result<Money, CommonError>;

    fn add(self, other: Money) -> Self::Output {
        if self.currency != other.currency {
            return Err(CommonError::CurrencyMismatch {
                expected: self.currency,
                actual: other.currency,
            });
        }
        match self.value.checked_add(other.value) {
            Some(value) => Ok(Money {
                value,
                currency: self.currency,
            }),
            None => Err(CommonError::AmountOverflow(self.currency)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_is_uppercased() {
        assert_eq!(Currency::new("usd"), Currency::usd());
        assert_eq!(Currency::new(" eur ").code(), "EUR");
    }

    #[test]
    fn test_currency_parse_rejects_garbage() {
        assert_eq!(Currency::parse("chf").unwrap(), Currency::chf());
        assert!(Currency::parse("").is_err());
        assert!(Currency::parse("US1").is_err());
    }

    #[test]
    fn test_pair_inverse_and_display() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::jpy());
        assert_eq!(pair.to_string(), "USD/JPY");
        assert_eq!(pair.inverse().to_string(), "JPY/USD");
        assert!(pair.involves(&Currency::jpy()));
        assert!(!pair.is_identity());
    }

    #[test]
    fn test_money_add_same_currency() {
        let a = Money::from_str("100.25", Currency::eur()).unwrap();
        let b = Money::from_str("0.75", Currency::eur()).unwrap();
        assert_eq!((a + b).unwrap().value, Decimal::from(101));
    }

    #[test]
    fn test_money_add_currency_mismatch() {
        let a = Money::from_str("1", Currency::eur()).unwrap();
        let b = Money::from_str("1", Currency::usd()).unwrap();
        assert!(matches!(a + b, Err(CommonError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_money_add_overflow() {
        let a = Money::new(Decimal::MAX, Currency::usd());
        let b = Money::new(Decimal::ONE, Currency::usd());
        assert_eq!(a + b, Err(CommonError::AmountOverflow(Currency::usd())));
    }

    #[test]
    fn test_money_round_uses_currency_places() {
        let yen = Money::from_str("1234.56", Currency::jpy()).unwrap();
        assert_eq!(yen.round().value, Decimal::from(1235));

        let usd = Money::from_str("10.005", Currency::usd()).unwrap();
        assert_eq!(usd.round().value.to_string(), "10.00");
    }
}
