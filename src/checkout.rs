//! Checkout details
//!
//! Shipping address and payment method selections shared by the client cart
//! and the server-side order.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an order is shipped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street address.
    pub address: String,

    /// City.
    pub city: String,

    /// Postal code.
    pub postal_code: String,

    /// Country.
    pub country: String,
}

impl ShippingAddress {
    /// Whether every field holds something other than whitespace.
    pub fn is_complete(&self) -> bool {
        [&self.address, &self.city, &self.postal_code, &self.country]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// How the buyer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card payment through the payment processor.
    #[serde(alias = "Stripe")]
    Card,

    /// `PayPal`; confirmed out of band.
    #[serde(alias = "PayPal")]
    PayPal,
}

impl PaymentMethod {
    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::PayPal => "paypal",
        }
    }

    /// Whether the payment processor can confirm this method programmatically.
    pub const fn has_processor_confirmation(self) -> bool {
        matches!(self, Self::Card)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Raised when parsing an unrecognised payment method.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown payment method {0:?}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "card" | "Stripe" => Ok(Self::Card),
            "paypal" | "PayPal" => Ok(Self::PayPal),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}
