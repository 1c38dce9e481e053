//! Pricing
//!
//! Derives the items, shipping, tax and grand totals for a set of lines. All
//! arithmetic happens in integer minor units and tax is the only rounded term.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::money::{CurrencyError, ensure_supported, to_decimal};

/// Errors raised while deriving prices.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// A line carried a negative unit price.
    #[error("unit price cannot be negative")]
    NegativePrice,

    /// An intermediate amount did not fit in minor units.
    #[error("price calculation overflowed")]
    Overflow,

    /// A policy amount or rate was negative.
    #[error("invalid pricing policy: {0}")]
    InvalidPolicy(&'static str),

    /// The policy currency cannot be priced.
    #[error(transparent)]
    Currency(#[from] CurrencyError),
}

/// Anything that can be priced as `unit price × quantity`.
pub trait PricedLine {
    /// Unit price in minor units.
    fn unit_price(&self) -> i64;

    /// Number of units.
    fn quantity(&self) -> u32;
}

/// Store-wide pricing rules.
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    currency: &'static Currency,
    free_shipping_threshold: i64,
    flat_shipping_fee: i64,
    tax_rate: Decimal,
}

impl PricingPolicy {
    /// Free shipping applies to orders whose items total exceeds this amount.
    pub const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 10_000;

    /// Fee charged when the free shipping threshold is not exceeded.
    pub const DEFAULT_FLAT_SHIPPING_FEE: i64 = 1_000;

    /// Creates a policy.
    ///
    /// # Errors
    ///
    /// - [`PricingError::Currency`]: the currency does not use two fraction digits.
    /// - [`PricingError::InvalidPolicy`]: an amount or the tax rate is negative.
    pub fn new(
        currency: &'static Currency,
        free_shipping_threshold: i64,
        flat_shipping_fee: i64,
        tax_rate: Decimal,
    ) -> Result<Self, PricingError> {
        let currency = ensure_supported(currency)?;

        if free_shipping_threshold < 0 {
            return Err(PricingError::InvalidPolicy(
                "free shipping threshold cannot be negative",
            ));
        }

        if flat_shipping_fee < 0 {
            return Err(PricingError::InvalidPolicy(
                "shipping fee cannot be negative",
            ));
        }

        if tax_rate.is_sign_negative() {
            return Err(PricingError::InvalidPolicy("tax rate cannot be negative"));
        }

        Ok(Self {
            currency,
            free_shipping_threshold,
            flat_shipping_fee,
            tax_rate,
        })
    }

    /// Default tax rate (10%).
    pub fn default_tax_rate() -> Decimal {
        Decimal::new(10, 2)
    }

    /// Currency every amount derived by this policy is expressed in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Free shipping threshold in minor units.
    pub fn free_shipping_threshold(&self) -> i64 {
        self.free_shipping_threshold
    }

    /// Flat shipping fee in minor units.
    pub fn flat_shipping_fee(&self) -> i64 {
        self.flat_shipping_fee
    }

    /// Tax rate as a fraction.
    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    fn shipping_fee(&self, items_total: i64) -> i64 {
        if items_total > self.free_shipping_threshold {
            0
        } else {
            self.flat_shipping_fee
        }
    }

    fn tax_on(&self, minor: i64) -> Result<i64, PricingError> {
        let Some(minor) = Decimal::from_i64(minor) else {
            return Err(PricingError::Overflow);
        };

        let Some(applied) = self.tax_rate.checked_mul(minor) else {
            return Err(PricingError::Overflow);
        };

        applied
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(PricingError::Overflow)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            currency: rusty_money::iso::USD,
            free_shipping_threshold: Self::DEFAULT_FREE_SHIPPING_THRESHOLD,
            flat_shipping_fee: Self::DEFAULT_FLAT_SHIPPING_FEE,
            tax_rate: Self::default_tax_rate(),
        }
    }
}

/// Derived amounts for a set of lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown {
    /// Sum of `unit price × quantity` over all lines.
    pub items_total: Money<'static, Currency>,

    /// Shipping fee; zero above the free shipping threshold.
    pub shipping_fee: Money<'static, Currency>,

    /// Tax on the items total, rounded half-up to the minor unit.
    pub tax: Money<'static, Currency>,

    /// `items_total + shipping_fee + tax`.
    pub grand_total: Money<'static, Currency>,
}

impl PriceBreakdown {
    /// Decimal amounts for display, each with exactly two fraction digits.
    pub fn display(&self) -> DisplayTotals {
        DisplayTotals {
            items_total: to_decimal(self.items_total.to_minor_units()),
            shipping_fee: to_decimal(self.shipping_fee.to_minor_units()),
            tax: to_decimal(self.tax.to_minor_units()),
            grand_total: to_decimal(self.grand_total.to_minor_units()),
        }
    }
}

/// Display form of a [`PriceBreakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTotals {
    /// Items total.
    pub items_total: Decimal,

    /// Shipping fee.
    pub shipping_fee: Decimal,

    /// Tax.
    pub tax: Decimal,

    /// Grand total.
    pub grand_total: Decimal,
}

/// Derives prices for the given lines under a policy.
///
/// Shipping is a flat fee regardless of destination, so the address plays no
/// part here.
///
/// # Errors
///
/// - [`PricingError::NegativePrice`]: a line has a negative unit price.
/// - [`PricingError::Overflow`]: a total does not fit in minor units.
pub fn derive<L: PricedLine>(
    policy: &PricingPolicy,
    lines: &[L],
) -> Result<PriceBreakdown, PricingError> {
    let items_total = lines.iter().try_fold(0_i64, |total, line| {
        let unit_price = line.unit_price();

        if unit_price < 0 {
            return Err(PricingError::NegativePrice);
        }

        unit_price
            .checked_mul(i64::from(line.quantity()))
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or(PricingError::Overflow)
    })?;

    let shipping_fee = policy.shipping_fee(items_total);
    let tax = policy.tax_on(items_total)?;

    let grand_total = items_total
        .checked_add(shipping_fee)
        .and_then(|total| total.checked_add(tax))
        .ok_or(PricingError::Overflow)?;

    let currency = policy.currency;

    Ok(PriceBreakdown {
        items_total: Money::from_minor(items_total, currency),
        shipping_fee: Money::from_minor(shipping_fee, currency),
        tax: Money::from_minor(tax, currency),
        grand_total: Money::from_minor(grand_total, currency),
    })
}
