//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::{FxHashMap, FxHashSet};
use sqlx::{Postgres, Transaction};
use storefront::{
    orders::{InvalidTransition, OrderStatus, Role},
    pricing::{PricingPolicy, derive},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{Actor, UserUuid},
    database::Db,
    domain::{
        orders::{
            errors::OrdersServiceError,
            models::{
                NewOrder, Order, OrderFilter, OrderItem, OrderUuid, Page, PaymentConfirmation,
                StatusUpdate,
            },
            repository::{OrderInsert, OrderRow, PgOrdersRepository},
        },
        products::models::{Product, ProductUuid},
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
    policy: PricingPolicy,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, policy: PricingPolicy) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
            policy,
        }
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rows: Vec<OrderRow>,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<OrderUuid> = rows.iter().map(|row| row.uuid).collect();

        let mut grouped: FxHashMap<OrderUuid, Vec<OrderItem>> = FxHashMap::default();

        for (order, item) in self.repository.list_order_items(tx, &uuids).await? {
            grouped.entry(order).or_default().push(item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = grouped.remove(&row.uuid).unwrap_or_default();

                row.with_items(items)
            })
            .collect())
    }

    async fn single_with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: OrderRow,
    ) -> Result<Order, OrdersServiceError> {
        let items = self
            .repository
            .list_order_items(tx, &[row.uuid])
            .await?
            .into_iter()
            .map(|(_, item)| item)
            .collect();

        Ok(row.with_items(items))
    }

    async fn find_submitted(
        &self,
        user: UserUuid,
        submission: Uuid,
    ) -> Result<Option<Order>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order = match self
            .repository
            .find_by_submission(&mut tx, user, submission)
            .await?
        {
            Some(row) => Some(self.single_with_items(&mut tx, row).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(order)
    }

    /// Freeze catalog data into order lines, refusing anything the buyer was not shown.
    fn freeze_items(
        order: &NewOrder,
        catalog: &FxHashMap<ProductUuid, Product>,
    ) -> Result<Vec<OrderItem>, OrdersServiceError> {
        order
            .items
            .iter()
            .map(|requested| {
                let product = catalog
                    .get(&requested.product)
                    .ok_or(OrdersServiceError::ProductNotFound(requested.product))?;

                if requested.quantity > product.count_in_stock {
                    return Err(OrdersServiceError::InsufficientStock {
                        product: product.uuid,
                        requested: requested.quantity,
                        available: product.count_in_stock,
                    });
                }

                let current = i64::try_from(product.price)?;

                if current != requested.unit_price {
                    return Err(OrdersServiceError::PriceChanged {
                        product: product.uuid,
                        shown: requested.unit_price,
                        current,
                    });
                }

                Ok(OrderItem {
                    product: product.uuid,
                    name: product.name.clone(),
                    image: product.image.clone(),
                    unit_price: current,
                    quantity: requested.quantity,
                })
            })
            .collect()
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn create_order(&self, actor: &Actor, order: NewOrder) -> Result<Order, OrdersServiceError> {
        let (Some(shipping_address), Some(payment_method)) =
            (order.shipping_address.as_ref(), order.payment_method)
        else {
            return Err(OrdersServiceError::IncompleteCheckout);
        };

        if !shipping_address.is_complete()
            || order.items.is_empty()
            || order.items.iter().any(|item| item.quantity == 0)
        {
            return Err(OrdersServiceError::IncompleteCheckout);
        }

        let products: Vec<ProductUuid> = order.items.iter().map(|item| item.product).collect();

        if products.iter().collect::<FxHashSet<_>>().len() != products.len() {
            return Err(OrdersServiceError::InvalidData);
        }

        let mut tx = self.db.begin().await?;

        if let Some(existing) = self
            .repository
            .find_by_submission(&mut tx, actor.user, order.submission)
            .await?
        {
            let existing = self.single_with_items(&mut tx, existing).await?;

            tx.commit().await?;

            info!(
                order_uuid = %existing.uuid,
                submission = %order.submission,
                "order already placed for submission"
            );

            return Ok(existing);
        }

        let catalog: FxHashMap<ProductUuid, Product> = self
            .repository
            .lock_products(&mut tx, &products)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product))
            .collect();

        let items = Self::freeze_items(&order, &catalog)?;
        let pricing = derive(&self.policy, &items)?;

        let created = self
            .repository
            .create_order(
                &mut tx,
                OrderInsert {
                    uuid: OrderUuid::new(),
                    user: actor.user,
                    submission: order.submission,
                    shipping_address,
                    payment_method,
                    pricing: &pricing,
                },
            )
            .await;

        let created = match created.map_err(OrdersServiceError::from) {
            Ok(created) => created,
            Err(OrdersServiceError::AlreadyExists) => {
                // A concurrent request for the same submission committed first.
                drop(tx);

                return self
                    .find_submitted(actor.user, order.submission)
                    .await?
                    .ok_or(OrdersServiceError::AlreadyExists);
            }
            Err(error) => return Err(error),
        };

        self.repository
            .create_order_items(&mut tx, created.uuid, &items)
            .await?;

        tx.commit().await?;

        info!(
            order_uuid = %created.uuid,
            user_uuid = %actor.user,
            total = pricing.grand_total.to_minor_units(),
            "order created"
        );

        Ok(created.with_items(items))
    }

    async fn get_order(&self, actor: &Actor, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let row = self.repository.get_order(&mut tx, order).await?;

        if row.user != actor.user && !actor.is_admin() {
            return Err(OrdersServiceError::Forbidden);
        }

        let order = self.single_with_items(&mut tx, row).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn list_orders(
        &self,
        actor: &Actor,
        filter: OrderFilter,
    ) -> Result<Page<Order>, OrdersServiceError> {
        if !actor.is_admin() {
            return Err(OrdersServiceError::Forbidden);
        }

        let page = filter.page.max(1);
        let per_page = filter.per_page.clamp(1, OrderFilter::MAX_PER_PAGE);
        let offset = i64::from(page - 1) * i64::from(per_page);

        let mut tx = self.db.begin().await?;

        let total = self.repository.count_orders(&mut tx, filter.status).await?;

        let rows = self
            .repository
            .list_orders(&mut tx, filter.status, i64::from(per_page), offset)
            .await?;

        let items = self.with_items(&mut tx, rows).await?;

        tx.commit().await?;

        Ok(Page {
            items,
            page,
            per_page,
            total: u64::try_from(total)?,
        })
    }

    async fn list_user_orders(&self, actor: &Actor) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let rows = self.repository.list_user_orders(&mut tx, actor.user).await?;
        let orders = self.with_items(&mut tx, rows).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn confirm_payment(
        &self,
        order: OrderUuid,
        confirmation: PaymentConfirmation,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let row = self.repository.lock_order(&mut tx, order).await?;
        let expected = row.pricing.grand_total.to_minor_units();

        if confirmation.amount != expected {
            warn!(
                order_uuid = %order,
                expected,
                received = confirmation.amount,
                "payment amount does not match order total"
            );

            return Err(OrdersServiceError::AmountMismatch {
                expected,
                received: confirmation.amount,
            });
        }

        let row = if row.is_paid {
            info!(order_uuid = %order, "payment already confirmed");

            row
        } else {
            let paid = self
                .repository
                .mark_paid(&mut tx, order, confirmation.reference.as_deref())
                .await?;

            info!(order_uuid = %order, amount = expected, "payment confirmed");

            paid
        };

        let order = self.single_with_items(&mut tx, row).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
        role: Role,
    ) -> Result<Order, OrdersServiceError> {
        if !role.is_admin() {
            return Err(OrdersServiceError::Forbidden);
        }

        if update.tracking_number.is_some() && update.status != OrderStatus::Shipped {
            return Err(OrdersServiceError::InvalidData);
        }

        let mut tx = self.db.begin().await?;

        let current = self.repository.lock_order(&mut tx, order).await?.status;
        let next = current.transition(update.status)?;

        let row = self
            .repository
            .update_status(
                &mut tx,
                order,
                current,
                next,
                update.tracking_number.as_deref(),
            )
            .await?
            .ok_or(InvalidTransition {
                from: current,
                to: next,
            })?;

        let updated = self.single_with_items(&mut tx, row).await?;

        tx.commit().await?;

        info!(
            order_uuid = %order,
            from = %current,
            to = %next,
            "order status changed"
        );

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Materialises a checkout into an order, at most once per submission.
    async fn create_order(&self, actor: &Actor, order: NewOrder)
    -> Result<Order, OrdersServiceError>;

    /// Retrieve an order owned by the actor, or any order for admins.
    async fn get_order(&self, actor: &Actor, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Lists all orders, newest first. Admin only.
    async fn list_orders(
        &self,
        actor: &Actor,
        filter: OrderFilter,
    ) -> Result<Page<Order>, OrdersServiceError>;

    /// Lists the actor's own orders, newest first.
    async fn list_user_orders(&self, actor: &Actor) -> Result<Vec<Order>, OrdersServiceError>;

    /// Records a payment. Confirming an already paid order with the same
    /// amount returns it unchanged.
    async fn confirm_payment(
        &self,
        order: OrderUuid,
        confirmation: PaymentConfirmation,
    ) -> Result<Order, OrdersServiceError>;

    /// Moves an order along the fulfilment lifecycle.
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
        role: Role,
    ) -> Result<Order, OrdersServiceError>;
}
