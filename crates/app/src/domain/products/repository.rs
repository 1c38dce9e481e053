//! Products Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    auth::UserUuid,
    database::try_get_unsigned,
    domain::products::models::{NewProduct, Product, ProductUuid, Review, ReviewUuid},
};

const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const LOCK_PRODUCT_SQL: &str = include_str!("sql/lock_product.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const CREATE_REVIEW_SQL: &str = include_str!("sql/create_review.sql");
const LIST_RATINGS_SQL: &str = include_str!("sql/list_ratings.sql");
const UPDATE_RATING_SQL: &str = include_str!("sql/update_rating.sql");
const LIST_REVIEWS_SQL: &str = include_str!("sql/list_reviews.sql");

/// Review fields written by [`PgProductsRepository::create_review`].
pub(crate) struct ReviewInsert<'a> {
    pub uuid: ReviewUuid,
    pub product: ProductUuid,
    pub user: UserUuid,
    pub name: &'a str,
    pub rating: u8,
    pub comment: &'a str,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Product, sqlx::Error> {
        query_as::<Postgres, Product>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Read a product and hold its row lock until the transaction ends.
    pub(crate) async fn lock_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Product, sqlx::Error> {
        query_as::<Postgres, Product>(LOCK_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &NewProduct,
    ) -> Result<Product, sqlx::Error> {
        let price_i64 = i64::try_from(product.price).map_err(|e| sqlx::Error::ColumnDecode {
            index: "price".to_string(),
            source: Box::new(e),
        })?;

        let stock_i32 =
            i32::try_from(product.count_in_stock).map_err(|e| sqlx::Error::ColumnDecode {
                index: "count_in_stock".to_string(),
                source: Box::new(e),
            })?;

        query_as::<Postgres, Product>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(&product.name)
            .bind(&product.image)
            .bind(price_i64)
            .bind(stock_i32)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewInsert<'_>,
    ) -> Result<Review, sqlx::Error> {
        query_as::<Postgres, Review>(CREATE_REVIEW_SQL)
            .bind(review.uuid.into_uuid())
            .bind(review.product.into_uuid())
            .bind(review.user.into_uuid())
            .bind(review.name)
            .bind(i16::from(review.rating))
            .bind(review.comment)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_ratings(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Vec<i16>, sqlx::Error> {
        query_scalar::<Postgres, i16>(LIST_RATINGS_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_rating(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        rating: Decimal,
        num_reviews: u32,
    ) -> Result<u64, sqlx::Error> {
        let num_reviews_i32 = i32::try_from(num_reviews).map_err(|e| sqlx::Error::ColumnDecode {
            index: "num_reviews".to_string(),
            source: Box::new(e),
        })?;

        let rows_affected = query(UPDATE_RATING_SQL)
            .bind(product.into_uuid())
            .bind(rating)
            .bind(num_reviews_i32)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn list_reviews(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Vec<Review>, sqlx::Error> {
        query_as::<Postgres, Review>(LIST_REVIEWS_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            image: row.try_get("image")?,
            price: try_get_unsigned::<u64, i64>(row, "price")?,
            count_in_stock: try_get_unsigned::<u32, i32>(row, "count_in_stock")?,
            rating: row.try_get("rating")?,
            num_reviews: try_get_unsigned::<u32, i32>(row, "num_reviews")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Review {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ReviewUuid::from_uuid(row.try_get("uuid")?),
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            user: UserUuid::from_uuid(row.try_get::<Uuid, _>("user_uuid")?),
            name: row.try_get("name")?,
            rating: try_get_unsigned::<u8, i16>(row, "rating")?,
            comment: row.try_get("comment")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
