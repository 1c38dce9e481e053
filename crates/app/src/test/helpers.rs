//! Test Helpers

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use storefront::{
    checkout::{PaymentMethod, ShippingAddress},
    orders::Role,
};
use uuid::Uuid;

use crate::{
    auth::{Actor, UserUuid, format_session_token, generate_session_secret, hash_session_secret},
    domain::{
        orders::models::{NewOrder, NewOrderItem},
        products::{
            ProductsService, ProductsServiceError,
            models::{NewProduct, Product, ProductUuid},
        },
    },
    test::TestContext,
};

pub(crate) fn customer(name: &str) -> Actor {
    Actor {
        user: UserUuid::new(),
        name: name.to_string(),
        role: Role::Customer,
    }
}

pub(crate) fn admin() -> Actor {
    Actor {
        user: UserUuid::new(),
        name: "Admin".to_string(),
        role: Role::Admin,
    }
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    price: u64,
    count_in_stock: u32,
) -> Result<Product, ProductsServiceError> {
    let uuid = ProductUuid::new();

    ctx.products
        .create_product(NewProduct {
            uuid,
            name: format!("Product {uuid}"),
            image: format!("/images/{uuid}.jpg"),
            price,
            count_in_stock,
        })
        .await
}

/// A complete checkout for the given products at their current catalog price.
pub(crate) fn new_order(items: &[(&Product, u32)]) -> NewOrder {
    NewOrder {
        submission: Uuid::now_v7(),
        items: items
            .iter()
            .map(|(product, quantity)| NewOrderItem {
                product: product.uuid,
                quantity: *quantity,
                unit_price: i64::try_from(product.price).unwrap_or(i64::MAX),
            })
            .collect(),
        shipping_address: Some(ShippingAddress {
            address: "221B Baker Street".to_string(),
            city: "London".to_string(),
            postal_code: "NW1 6XE".to_string(),
            country: "GB".to_string(),
        }),
        payment_method: Some(PaymentMethod::Card),
    }
}

/// Insert a session row the way the identity service would and return its bearer token.
pub(crate) async fn create_session(
    ctx: &TestContext,
    user: UserUuid,
    name: &str,
    role: Role,
    expires_at: Option<Timestamp>,
) -> Result<String, sqlx::Error> {
    let secret = generate_session_secret();

    sqlx::query(
        "INSERT INTO user_sessions (token_hash, user_uuid, name, role, expires_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(hash_session_secret(&secret))
    .bind(user.into_uuid())
    .bind(name)
    .bind(role.as_str())
    .bind(expires_at.map(SqlxTimestamp::from))
    .execute(ctx.db.pool())
    .await?;

    Ok(format_session_token(&secret))
}
