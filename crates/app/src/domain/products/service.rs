//! Products service.

use async_trait::async_trait;
use mockall::automock;
use storefront::reviews::{Rating, ReviewSummary, recompute};
use tracing::info;

use crate::{
    auth::Actor,
    database::Db,
    domain::products::{
        errors::ProductsServiceError,
        models::{NewProduct, NewReview, Product, ProductUuid, Review, ReviewUuid},
        repository::{PgProductsRepository, ReviewInsert},
    },
};

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError> {
        if product.name.trim().is_empty() {
            return Err(ProductsServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_product(&mut tx, &product).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn add_review(
        &self,
        actor: &Actor,
        product: ProductUuid,
        review: NewReview,
    ) -> Result<ReviewSummary, ProductsServiceError> {
        let rating = Rating::new(review.rating)?;

        if review.comment.trim().is_empty() {
            return Err(ProductsServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;

        self.repository.lock_product(&mut tx, product).await?;

        let created = self
            .repository
            .create_review(
                &mut tx,
                ReviewInsert {
                    uuid: ReviewUuid::new(),
                    product,
                    user: actor.user,
                    name: &actor.name,
                    rating: rating.get(),
                    comment: &review.comment,
                },
            )
            .await
            .map_err(|error| match ProductsServiceError::from(error) {
                ProductsServiceError::AlreadyExists => ProductsServiceError::DuplicateReview,
                other => other,
            })?;

        let ratings = self
            .repository
            .list_ratings(&mut tx, product)
            .await?
            .into_iter()
            .map(|stored| Rating::new(i64::from(stored)))
            .collect::<Result<Vec<_>, _>>()?;

        let summary = recompute(ratings);

        self.repository
            .update_rating(&mut tx, product, summary.rating, summary.num_reviews)
            .await?;

        tx.commit().await?;

        info!(
            product_uuid = %product,
            review_uuid = %created.uuid,
            rating = %summary.rating,
            num_reviews = summary.num_reviews,
            "review added"
        );

        Ok(summary)
    }

    async fn list_reviews(&self, product: ProductUuid) -> Result<Vec<Review>, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository.get_product(&mut tx, product).await?;

        let reviews = self.repository.list_reviews(&mut tx, product).await?;

        tx.commit().await?;

        Ok(reviews)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Creates a catalog product.
    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError>;

    /// Records a review and returns the product's recomputed rating.
    ///
    /// The insert and the aggregate update commit together while the product
    /// row is locked, so concurrent reviews cannot lose each other's ratings.
    async fn add_review(
        &self,
        actor: &Actor,
        product: ProductUuid,
        review: NewReview,
    ) -> Result<ReviewSummary, ProductsServiceError>;

    /// Reviews for a product, newest first.
    async fn list_reviews(&self, product: ProductUuid) -> Result<Vec<Review>, ProductsServiceError>;
}
