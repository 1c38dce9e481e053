//! Order Models

use jiff::Timestamp;
use storefront::{
    cart::CheckoutSubmission,
    checkout::{PaymentMethod, ShippingAddress},
    orders::OrderStatus,
    pricing::{PriceBreakdown, PricedLine},
};
use uuid::Uuid;

use crate::{auth::UserUuid, domain::products::models::ProductUuid, uuids::TypedUuid};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order Model
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub uuid: OrderUuid,
    pub user: UserUuid,
    pub submission: Uuid,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub pricing: PriceBreakdown,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<Timestamp>,
    pub payment_reference: Option<String>,
    pub tracking_number: Option<String>,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Amount the buyer owes, in minor units.
    #[must_use]
    pub fn total_minor(&self) -> i64 {
        self.pricing.grand_total.to_minor_units()
    }
}

/// Order line frozen from the catalog when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub product: ProductUuid,
    pub name: String,
    pub image: String,
    pub unit_price: i64,
    pub quantity: u32,
}

impl PricedLine for OrderItem {
    fn unit_price(&self) -> i64 {
        self.unit_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// New Order Model
///
/// Carries what the buyer saw; the service re-reads the catalog and refuses
/// to charge a different price.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub submission: Uuid,
    pub items: Vec<NewOrderItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
}

/// A requested order line with the unit price the buyer was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product: ProductUuid,
    pub quantity: u32,
    pub unit_price: i64,
}

impl From<CheckoutSubmission> for NewOrder {
    fn from(submission: CheckoutSubmission) -> Self {
        Self {
            submission: submission.submission,
            items: submission
                .items
                .iter()
                .map(|item| NewOrderItem {
                    product: ProductUuid::from_uuid(item.product),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            shipping_address: Some(submission.shipping_address),
            payment_method: Some(submission.payment_method),
        }
    }
}

/// Admin order listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl OrderFilter {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// Proof of payment reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Amount paid in minor units.
    pub amount: i64,
    pub reference: Option<String>,
}

/// Fulfilment update requested by staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}
