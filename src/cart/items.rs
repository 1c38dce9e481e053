//! Cart Items

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::PricedLine;

/// Catalog data captured when a product is added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Catalog product.
    pub product: Uuid,

    /// Product name at the time it was added.
    pub name: String,

    /// Unit price in minor units at the time it was added.
    pub unit_price: i64,

    /// Image reference.
    pub image: String,

    /// Stock level at the time it was added; informational only.
    pub count_in_stock: u32,
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog product.
    pub product: Uuid,

    /// Snapshot of the product name.
    pub name: String,

    /// Snapshot of the unit price in minor units.
    pub unit_price: i64,

    /// Snapshot of the image reference.
    pub image: String,

    /// Snapshot of the stock level.
    pub count_in_stock: u32,

    /// Units of the product, at least one.
    pub quantity: u32,
}

impl CartItem {
    /// Creates a line from a product snapshot.
    pub fn new(snapshot: ProductSnapshot, quantity: u32) -> Self {
        Self {
            product: snapshot.product,
            name: snapshot.name,
            unit_price: snapshot.unit_price,
            image: snapshot.image,
            count_in_stock: snapshot.count_in_stock,
            quantity,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.quantity >= 1 && self.unit_price >= 0
    }
}

impl PricedLine for CartItem {
    fn unit_price(&self) -> i64 {
        self.unit_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}
