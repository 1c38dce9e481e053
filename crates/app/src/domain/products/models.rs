//! Product Models

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{auth::UserUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Review UUID
pub type ReviewUuid = TypedUuid<Review>;

/// Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub uuid: ProductUuid,
    pub name: String,
    pub image: String,
    pub price: u64,
    pub count_in_stock: u32,
    pub rating: Decimal,
    pub num_reviews: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub image: String,
    pub price: u64,
    pub count_in_stock: u32,
}

/// Review Model
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub uuid: ReviewUuid,
    pub product: ProductUuid,
    pub user: UserUuid,
    pub name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: Timestamp,
}

/// New Review Model
///
/// The rating is unvalidated input; the service rejects anything outside 1 to 5.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub rating: i64,
    pub comment: String,
}
