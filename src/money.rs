//! Money
//!
//! Amounts are carried as integer minor units everywhere inside the crate and
//! only become decimals at the display boundary.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Findable, iso::Currency};
use thiserror::Error;

/// Number of fraction digits every supported currency uses.
pub const MINOR_UNIT_DIGITS: u32 = 2;

/// Errors raised while resolving a store currency.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The code is not an ISO 4217 currency.
    #[error("unknown currency code {0:?}")]
    Unknown(String),

    /// The currency does not use two fraction digits.
    #[error("currency {code} uses {exponent} fraction digits, only {MINOR_UNIT_DIGITS} are supported")]
    UnsupportedExponent {
        /// ISO code of the rejected currency.
        code: &'static str,

        /// Fraction digits the currency uses.
        exponent: u32,
    },
}

/// Errors raised while converting a decimal amount into minor units.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    /// The amount carries more than two fraction digits.
    #[error("amount has more than {MINOR_UNIT_DIGITS} fraction digits")]
    TooPrecise,

    /// The amount does not fit in minor units.
    #[error("amount is out of range")]
    OutOfRange,
}

/// Look up a currency by its ISO code and check it can be priced.
///
/// # Errors
///
/// - [`CurrencyError::Unknown`]: the code is not a known currency.
/// - [`CurrencyError::UnsupportedExponent`]: the currency does not use two fraction digits.
pub fn find_currency(code: &str) -> Result<&'static Currency, CurrencyError> {
    let Some(currency) = Currency::find(code) else {
        return Err(CurrencyError::Unknown(code.to_string()));
    };

    ensure_supported(currency)
}

/// Check a currency uses two fraction digits.
///
/// # Errors
///
/// Returns [`CurrencyError::UnsupportedExponent`] for any other exponent.
pub fn ensure_supported(currency: &'static Currency) -> Result<&'static Currency, CurrencyError> {
    if currency.exponent != MINOR_UNIT_DIGITS {
        return Err(CurrencyError::UnsupportedExponent {
            code: currency.iso_alpha_code,
            exponent: currency.exponent,
        });
    }

    Ok(currency)
}

/// Converts minor units into a decimal with exactly two fraction digits.
pub fn to_decimal(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_DIGITS)
}

/// Converts a decimal amount into minor units without rounding.
///
/// # Errors
///
/// - [`AmountError::TooPrecise`]: the amount has sub-cent digits.
/// - [`AmountError::OutOfRange`]: the amount does not fit in an `i64` of minor units.
pub fn to_minor(amount: Decimal) -> Result<i64, AmountError> {
    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(AmountError::OutOfRange)?;

    if !scaled.fract().is_zero() {
        return Err(AmountError::TooPrecise);
    }

    scaled.to_i64().ok_or(AmountError::OutOfRange)
}
