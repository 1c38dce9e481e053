//! Order wire models.
//!
//! Amounts leave the API as decimal strings with two fraction digits.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use storefront::{checkout::ShippingAddress, money::to_decimal};
use storefront_app::domain::orders::models::{Order, OrderItem};
use uuid::Uuid;

/// Decimal string for an amount in minor units, e.g. `"92.50"`.
pub(crate) fn amount(minor: i64) -> String {
    to_decimal(minor).to_string()
}

/// Shipping address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct ShippingAddressBody {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl From<ShippingAddressBody> for ShippingAddress {
    fn from(body: ShippingAddressBody) -> Self {
        ShippingAddress {
            address: body.address,
            city: body.city,
            postal_code: body.postal_code,
            country: body.country,
        }
    }
}

impl From<ShippingAddress> for ShippingAddressBody {
    fn from(address: ShippingAddress) -> Self {
        ShippingAddressBody {
            address: address.address,
            city: address.city,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    /// The product this line was ordered from
    pub product: Uuid,

    /// Product name when the order was placed
    pub name: String,

    /// Product image when the order was placed
    pub image: String,

    /// Unit price when the order was placed
    pub unit_price: String,

    pub quantity: u32,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        OrderItemResponse {
            product: item.product.into(),
            name: item.name,
            image: item.image,
            unit_price: amount(item.unit_price),
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    /// The unique identifier of the order
    pub uuid: Uuid,

    /// The buyer
    pub user: Uuid,

    /// Fulfilment status
    pub status: String,

    /// How the buyer chose to pay
    pub payment_method: String,

    pub shipping_address: ShippingAddressBody,

    pub items: Vec<OrderItemResponse>,

    /// ISO 4217 code every amount is expressed in
    pub currency: String,

    pub items_price: String,
    pub shipping_price: String,
    pub tax_price: String,
    pub total_price: String,

    pub is_paid: bool,
    pub paid_at: Option<String>,
    pub payment_reference: Option<String>,

    pub tracking_number: Option<String>,
    pub delivered_at: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let pricing = order.pricing;

        OrderResponse {
            uuid: order.uuid.into(),
            user: order.user.into(),
            status: order.status.to_string(),
            payment_method: order.payment_method.to_string(),
            shipping_address: order.shipping_address.into(),
            items: order.items.into_iter().map(Into::into).collect(),
            currency: pricing.grand_total.currency().iso_alpha_code.to_string(),
            items_price: amount(pricing.items_total.to_minor_units()),
            shipping_price: amount(pricing.shipping_fee.to_minor_units()),
            tax_price: amount(pricing.tax.to_minor_units()),
            total_price: amount(pricing.grand_total.to_minor_units()),
            is_paid: order.is_paid,
            paid_at: order.paid_at.as_ref().map(ToString::to_string),
            payment_reference: order.payment_reference,
            tracking_number: order.tracking_number,
            delivered_at: order.delivered_at.as_ref().map(ToString::to_string),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    /// Orders, newest first
    pub orders: Vec<OrderResponse>,
}
