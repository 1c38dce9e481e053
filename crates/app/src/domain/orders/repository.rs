//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rusty_money::Money;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use storefront::{
    checkout::{PaymentMethod, ShippingAddress},
    money::find_currency,
    orders::OrderStatus,
    pricing::PriceBreakdown,
};
use uuid::Uuid;

use crate::{
    auth::UserUuid,
    database::try_get_unsigned,
    domain::{
        orders::models::{Order, OrderItem, OrderUuid},
        products::models::{Product, ProductUuid},
    },
};

const FIND_ORDER_BY_SUBMISSION_SQL: &str = include_str!("sql/find_order_by_submission.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const LOCK_PRODUCTS_SQL: &str = include_str!("sql/lock_products.sql");
const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_ITEMS_SQL: &str = include_str!("sql/create_order_items.sql");
const LIST_ORDER_ITEMS_SQL: &str = include_str!("sql/list_order_items.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const COUNT_ORDERS_SQL: &str = include_str!("sql/count_orders.sql");
const LIST_USER_ORDERS_SQL: &str = include_str!("sql/list_user_orders.sql");
const MARK_ORDER_PAID_SQL: &str = include_str!("sql/mark_order_paid.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");

/// An `orders` row; items live in their own table.
#[derive(Debug, Clone)]
pub(crate) struct OrderRow {
    pub uuid: OrderUuid,
    pub user: UserUuid,
    pub submission: Uuid,
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

impl OrderRow {
    pub(crate) fn with_items(self, items: Vec<OrderItem>) -> Order {
        Order {
            uuid: self.uuid,
            user: self.user,
            submission: self.submission,
            items,
            shipping_address: self.shipping_address,
            payment_method: self.payment_method,
            pricing: self.pricing,
            status: self.status,
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            payment_reference: self.payment_reference,
            tracking_number: self.tracking_number,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Order fields written by [`PgOrdersRepository::create_order`].
pub(crate) struct OrderInsert<'a> {
    pub uuid: OrderUuid,
    pub user: UserUuid,
    pub submission: Uuid,
    pub shipping_address: &'a ShippingAddress,
    pub payment_method: PaymentMethod,
    pub pricing: &'a PriceBreakdown,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_by_submission(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        submission: Uuid,
    ) -> Result<Option<OrderRow>, sqlx::Error> {
        query_as::<Postgres, OrderRow>(FIND_ORDER_BY_SUBMISSION_SQL)
            .bind(user.into_uuid())
            .bind(submission)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRow, sqlx::Error> {
        query_as::<Postgres, OrderRow>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Read an order and hold its row lock until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRow, sqlx::Error> {
        query_as::<Postgres, OrderRow>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Read catalog rows with a share lock so price and stock cannot change
    /// before the order commits.
    pub(crate) async fn lock_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<Product>, sqlx::Error> {
        let uuids: Vec<Uuid> = products.iter().map(|product| product.into_uuid()).collect();

        query_as::<Postgres, Product>(LOCK_PRODUCTS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderInsert<'_>,
    ) -> Result<OrderRow, sqlx::Error> {
        let pricing = order.pricing;

        query_as::<Postgres, OrderRow>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.user.into_uuid())
            .bind(order.submission)
            .bind(&order.shipping_address.address)
            .bind(&order.shipping_address.city)
            .bind(&order.shipping_address.postal_code)
            .bind(&order.shipping_address.country)
            .bind(order.payment_method.as_str())
            .bind(pricing.grand_total.currency().iso_alpha_code)
            .bind(pricing.items_total.to_minor_units())
            .bind(pricing.shipping_fee.to_minor_units())
            .bind(pricing.tax.to_minor_units())
            .bind(pricing.grand_total.to_minor_units())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        items: &[OrderItem],
    ) -> Result<u64, sqlx::Error> {
        let mut uuids = Vec::with_capacity(items.len());
        let mut products = Vec::with_capacity(items.len());
        let mut positions = Vec::with_capacity(items.len());
        let mut names = Vec::with_capacity(items.len());
        let mut images = Vec::with_capacity(items.len());
        let mut unit_prices = Vec::with_capacity(items.len());
        let mut quantities = Vec::with_capacity(items.len());

        for (position, item) in items.iter().enumerate() {
            let position = i32::try_from(position).map_err(|e| sqlx::Error::ColumnDecode {
                index: "position".to_string(),
                source: Box::new(e),
            })?;

            let quantity = i32::try_from(item.quantity).map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })?;

            uuids.push(Uuid::now_v7());
            products.push(item.product.into_uuid());
            positions.push(position);
            names.push(item.name.clone());
            images.push(item.image.clone());
            unit_prices.push(item.unit_price);
            quantities.push(quantity);
        }

        let rows_affected = query(CREATE_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .bind(uuids)
            .bind(products)
            .bind(positions)
            .bind(names)
            .bind(images)
            .bind(unit_prices)
            .bind(quantities)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Items for each of the given orders, in their original cart order.
    pub(crate) async fn list_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<(OrderUuid, OrderItem)>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().map(|order| order.into_uuid()).collect();

        query_as::<Postgres, OrderItemRow>(LIST_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
            .map(|rows| rows.into_iter().map(|row| (row.order, row.item)).collect())
    }

    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderRow>, sqlx::Error> {
        query_as::<Postgres, OrderRow>(LIST_ORDERS_SQL)
            .bind(status.map(OrderStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn count_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        status: Option<OrderStatus>,
    ) -> Result<i64, sqlx::Error> {
        query_scalar::<Postgres, i64>(COUNT_ORDERS_SQL)
            .bind(status.map(OrderStatus::as_str))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_user_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRow>, sqlx::Error> {
        query_as::<Postgres, OrderRow>(LIST_USER_ORDERS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        reference: Option<&str>,
    ) -> Result<OrderRow, sqlx::Error> {
        query_as::<Postgres, OrderRow>(MARK_ORDER_PAID_SQL)
            .bind(order.into_uuid())
            .bind(reference)
            .fetch_one(&mut **tx)
            .await
    }

    /// Move an order to `next` only if it is still in `expected`.
    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        expected: OrderStatus,
        next: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Option<OrderRow>, sqlx::Error> {
        query_as::<Postgres, OrderRow>(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(expected.as_str())
            .bind(next.as_str())
            .bind(tracking_number)
            .fetch_optional(&mut **tx)
            .await
    }
}

struct OrderItemRow {
    order: OrderUuid,
    item: OrderItem,
}

fn decode_error<E>(column: &str, error: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let currency_code: String = row.try_get("currency")?;
        let currency = find_currency(&currency_code).map_err(|e| decode_error("currency", e))?;

        let payment_method: String = row.try_get("payment_method")?;
        let status: String = row.try_get("status")?;

        let money = |column: &str| -> sqlx::Result<_> {
            Ok(Money::from_minor(row.try_get::<i64, _>(column)?, currency))
        };

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            submission: row.try_get("submission_uuid")?,
            shipping_address: ShippingAddress {
                address: row.try_get("shipping_address")?,
                city: row.try_get("shipping_city")?,
                postal_code: row.try_get("shipping_postal_code")?,
                country: row.try_get("shipping_country")?,
            },
            payment_method: payment_method
                .parse()
                .map_err(|e| decode_error("payment_method", e))?,
            pricing: PriceBreakdown {
                items_total: money("items_price")?,
                shipping_fee: money("shipping_price")?,
                tax: money("tax_price")?,
                grand_total: money("total_price")?,
            },
            status: status.parse().map_err(|e| decode_error("status", e))?,
            is_paid: row.try_get("is_paid")?,
            paid_at: row
                .try_get::<Option<SqlxTimestamp>, _>("paid_at")?
                .map(SqlxTimestamp::to_jiff),
            payment_reference: row.try_get("payment_reference")?,
            tracking_number: row.try_get("tracking_number")?,
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            item: OrderItem {
                product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
                name: row.try_get("name")?,
                image: row.try_get("image")?,
                unit_price: row.try_get("unit_price")?,
                quantity: try_get_unsigned::<u32, i32>(row, "quantity")?,
            },
        })
    }
}
