//! Payment Models

use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::{
    auth::UserUuid,
    domain::orders::models::{Order, OrderUuid},
};

/// What to ask the processor to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentRequest {
    pub order: OrderUuid,
    pub user: UserUuid,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: &'static Currency,
}

impl IntentRequest {
    #[must_use]
    pub fn for_order(order: &Order) -> Self {
        Self {
            order: order.uuid,
            user: order.user,
            amount: order.total_minor(),
            currency: order.pricing.grand_total.currency(),
        }
    }
}

/// Processor-side state of a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

/// A payment intent as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    /// Only present on intents the caller may confirm client-side.
    pub client_secret: Option<String>,
    /// Amount in minor units.
    pub amount: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    pub status: IntentStatus,
    pub order: Option<OrderUuid>,
    pub user: Option<UserUuid>,
}

impl PaymentIntent {
    /// Whether the intent was created for this order in its currency.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.order == Some(order.uuid)
            && self
                .currency
                .eq_ignore_ascii_case(order.pricing.grand_total.currency().iso_alpha_code)
    }
}

/// Values the browser needs to initialise the processor's client library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentsConfig {
    pub publishable_key: String,
}
