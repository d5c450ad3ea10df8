//! Currency conversion at a historical rate.

use chrono::NaiveDate;
use ledgerfx_common::{Currency, CurrencyPair, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// A converted amount together with the rate that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// Input amount.
    pub input: Money,
    /// Output amount, rounded to the target currency's decimal places.
    pub output: Money,
    /// Rate used, `input.currency -> output.currency`.
    pub rate: f64,
    /// Date the rate was requested for.
    pub date: NaiveDate,
}

impl Conversion {
    pub fn new(input: Money, output: Money, rate: f64, date: NaiveDate) -> Self {
        Self {
            input,
            output,
            rate,
            date,
        }
    }

    /// Rate implied by the rounded amounts.
    pub fn effective_rate(&self) -> Decimal {
        if self.input.value.is_zero() {
            return Decimal::ZERO;
        }
        self.output.value / self.input.value
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.input.currency.clone(), self.output.currency.clone())
    }
}

/// Multiply `amount` by `rate` into `target`, rounding to its decimal places.
///
/// An infinite or NaN rate is `NonFiniteRate`; a finite rate or product
/// outside the decimal range is `AmountOverflow`.
pub(crate) fn apply_rate(
    amount: &Money,
    rate: f64,
    target: &Currency,
    date: NaiveDate,
) -> FxResult<Money> {
    if !rate.is_finite() {
        return Err(FxError::NonFiniteRate {
            pair: CurrencyPair::new(amount.currency.clone(), target.clone()),
            date,
        });
    }
    let overflow = || FxError::AmountOverflow {
        currency: target.clone(),
        date,
    };
    let rate = Decimal::from_f64_retain(rate).ok_or_else(overflow)?;
    let value = amount.value.checked_mul(rate).ok_or_else(overflow)?;
    Ok(Money::new(value, target.clone()).round())
}
