//! Cart Store

use std::future::Future;

use rustc_hash::FxHashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    cart::{
        CartError, CartItem, CartStorage, CheckoutStep, PlaceOrderError, ProductSnapshot,
        persistence::{
            CART_ITEMS_KEY, PAYMENT_METHOD_KEY, PersistedItems, SHIPPING_ADDRESS_KEY, encode, load,
        },
    },
    checkout::{PaymentMethod, ShippingAddress},
    pricing::{PriceBreakdown, PricingPolicy, derive},
};

#[derive(Debug, Clone, PartialEq)]
struct CartState {
    submission: Uuid,
    items: Vec<CartItem>,
    shipping_address: Option<ShippingAddress>,
    payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Items,
    ShippingAddress,
    PaymentMethod,
}

/// Point-in-time view of the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    /// Identifier of the pending checkout submission.
    pub submission: Uuid,

    /// Lines in insertion order.
    pub items: Vec<CartItem>,

    /// Shipping address, when set.
    pub shipping_address: Option<ShippingAddress>,

    /// Payment method, when chosen.
    pub payment_method: Option<PaymentMethod>,

    /// Prices derived from `items`.
    pub pricing: PriceBreakdown,
}

/// A cart that is complete enough to become an order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSubmission {
    /// Idempotency key for order creation.
    pub submission: Uuid,

    /// Lines, never empty.
    pub items: Vec<CartItem>,

    /// Complete shipping address.
    pub shipping_address: ShippingAddress,

    /// Chosen payment method.
    pub payment_method: PaymentMethod,

    /// Prices the buyer was shown.
    pub pricing: PriceBreakdown,
}

/// Owns the client-side cart.
///
/// Every mutation is staged on a copy, priced, persisted and only then made
/// visible, so the in-memory state, the derived prices and the stored state
/// always agree. A failed mutation leaves all three untouched.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    policy: PricingPolicy,
    state: CartState,
    pricing: PriceBreakdown,
}

impl<S: CartStorage> CartStore<S> {
    /// Restore a cart from storage. Unreadable or unknown-version values
    /// restore as unset, as do items that could never be checked out.
    ///
    /// # Errors
    ///
    /// - [`CartError::Storage`]: the backend could not be read.
    /// - [`CartError::Pricing`]: the empty cart could not be priced under `policy`.
    pub fn open(storage: S, policy: PricingPolicy) -> Result<Self, CartError> {
        let restored = load::<S, PersistedItems>(&storage, CART_ITEMS_KEY)?
            .and_then(|persisted| restore_items(&policy, persisted));

        let (submission, items, pricing) = match restored {
            Some((persisted, pricing)) => (persisted.submission, persisted.items, pricing),
            None => (Uuid::now_v7(), Vec::new(), derive::<CartItem>(&policy, &[])?),
        };

        let state = CartState {
            submission,
            items,
            shipping_address: load(&storage, SHIPPING_ADDRESS_KEY)?,
            payment_method: load(&storage, PAYMENT_METHOD_KEY)?,
        };

        Ok(Self {
            storage,
            policy,
            state,
            pricing,
        })
    }

    /// Add `quantity` units of a product. A product already in the cart has
    /// its quantity increased and keeps its original snapshot.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero or the total overflows.
    /// - [`CartError::Storage`]: the new state could not be persisted.
    pub fn add_item(&mut self, product: ProductSnapshot, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut next = self.state.clone();

        match next
            .items
            .iter_mut()
            .find(|item| item.product == product.product)
        {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::InvalidQuantity)?;
            }
            None => next.items.push(CartItem::new(product, quantity)),
        }

        self.commit(next, Slot::Items)
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::ItemNotFound`]: the product is not in the cart.
    /// - [`CartError::Storage`]: the new state could not be persisted.
    pub fn set_quantity(&mut self, product: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut next = self.state.clone();

        let item = next
            .items
            .iter_mut()
            .find(|item| item.product == product)
            .ok_or(CartError::ItemNotFound(product))?;

        item.quantity = quantity;

        self.commit(next, Slot::Items)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// - [`CartError::ItemNotFound`]: the product is not in the cart.
    /// - [`CartError::Storage`]: the new state could not be persisted.
    pub fn remove_item(&mut self, product: Uuid) -> Result<(), CartError> {
        let mut next = self.state.clone();
        let before = next.items.len();

        next.items.retain(|item| item.product != product);

        if next.items.len() == before {
            return Err(CartError::ItemNotFound(product));
        }

        self.commit(next, Slot::Items)
    }

    /// Set the shipping address.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] when the new state could not be persisted.
    pub fn set_shipping_address(&mut self, address: ShippingAddress) -> Result<(), CartError> {
        let mut next = self.state.clone();

        next.shipping_address = Some(address);

        self.commit(next, Slot::ShippingAddress)
    }

    /// Choose the payment method.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] when the new state could not be persisted.
    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<(), CartError> {
        let mut next = self.state.clone();

        next.payment_method = Some(method);

        self.commit(next, Slot::PaymentMethod)
    }

    /// Empty the cart and start a new submission. The shipping address and
    /// payment method are kept for the next checkout.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] when the new state could not be persisted.
    pub fn clear(&mut self) -> Result<(), CartError> {
        let next = CartState {
            submission: Uuid::now_v7(),
            items: Vec::new(),
            ..self.state.clone()
        };

        self.commit(next, Slot::Items)
    }

    /// Current cart contents and prices.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            submission: self.state.submission,
            items: self.state.items.clone(),
            shipping_address: self.state.shipping_address.clone(),
            payment_method: self.state.payment_method,
            pricing: self.pricing,
        }
    }

    /// Current derived prices.
    pub fn pricing(&self) -> &PriceBreakdown {
        &self.pricing
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.state.items
    }

    /// The cart as an order submission.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::IncompleteCheckout`] naming the first missing detail.
    pub fn checkout(&self) -> Result<CheckoutSubmission, CartError> {
        if self.state.items.is_empty() {
            return Err(CartError::IncompleteCheckout(CheckoutStep::Items));
        }

        let Some(shipping_address) = self
            .state
            .shipping_address
            .clone()
            .filter(ShippingAddress::is_complete)
        else {
            return Err(CartError::IncompleteCheckout(CheckoutStep::ShippingAddress));
        };

        let Some(payment_method) = self.state.payment_method else {
            return Err(CartError::IncompleteCheckout(CheckoutStep::PaymentMethod));
        };

        Ok(CheckoutSubmission {
            submission: self.state.submission,
            items: self.state.items.clone(),
            shipping_address,
            payment_method,
            pricing: self.pricing,
        })
    }

    /// Submit the cart through `create` and clear it once the order exists.
    ///
    /// `create` is not called for an incomplete cart. The cart is cleared
    /// exactly once, and only after `create` succeeds.
    ///
    /// # Errors
    ///
    /// - [`PlaceOrderError::Cart`]: the cart is incomplete.
    /// - [`PlaceOrderError::Submit`]: `create` failed; the cart is unchanged.
    /// - [`PlaceOrderError::ClearFailed`]: the order was created but the
    ///   cart could not be cleared; the order is returned inside the error.
    pub async fn place_order<F, Fut, O, E>(&mut self, create: F) -> Result<O, PlaceOrderError<O, E>>
    where
        F: FnOnce(CheckoutSubmission) -> Fut,
        Fut: Future<Output = Result<O, E>>,
    {
        let submission = self.checkout().map_err(PlaceOrderError::Cart)?;
        let submission_id = submission.submission;

        let order = create(submission).await.map_err(PlaceOrderError::Submit)?;

        if let Err(source) = self.clear() {
            warn!(%submission_id, "order created but cart could not be cleared: {source}");

            return Err(PlaceOrderError::ClearFailed { order, source });
        }

        info!(%submission_id, "order placed, cart cleared");

        Ok(order)
    }

    /// Release the storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn commit(&mut self, next: CartState, slot: Slot) -> Result<(), CartError> {
        let pricing = derive(&self.policy, &next.items)?;

        self.persist(&next, slot)?;

        self.state = next;
        self.pricing = pricing;

        Ok(())
    }

    fn persist(&mut self, next: &CartState, slot: Slot) -> Result<(), CartError> {
        match slot {
            Slot::Items => {
                let raw = encode(
                    CART_ITEMS_KEY,
                    &PersistedItems {
                        submission: next.submission,
                        items: next.items.clone(),
                    },
                )?;

                self.storage.save(CART_ITEMS_KEY, &raw)?;
            }
            Slot::ShippingAddress => match &next.shipping_address {
                Some(address) => {
                    let raw = encode(SHIPPING_ADDRESS_KEY, address)?;

                    self.storage.save(SHIPPING_ADDRESS_KEY, &raw)?;
                }
                None => self.storage.remove(SHIPPING_ADDRESS_KEY)?,
            },
            Slot::PaymentMethod => match next.payment_method {
                Some(method) => {
                    let raw = encode(PAYMENT_METHOD_KEY, &method)?;

                    self.storage.save(PAYMENT_METHOD_KEY, &raw)?;
                }
                None => self.storage.remove(PAYMENT_METHOD_KEY)?,
            },
        }

        Ok(())
    }
}

/// Restored items are kept only as a whole set that can still be priced and
/// checked out.
fn restore_items(
    policy: &PricingPolicy,
    persisted: PersistedItems,
) -> Option<(PersistedItems, PriceBreakdown)> {
    if !persisted.items.iter().all(CartItem::is_valid) {
        warn!(key = CART_ITEMS_KEY, "discarding cart items with invalid lines");

        return None;
    }

    let mut seen = FxHashSet::default();

    if !persisted.items.iter().all(|item| seen.insert(item.product)) {
        warn!(key = CART_ITEMS_KEY, "discarding cart items with repeated products");

        return None;
    }

    match derive(policy, &persisted.items) {
        Ok(pricing) => Some((persisted, pricing)),
        Err(error) => {
            warn!(key = CART_ITEMS_KEY, %error, "discarding cart items that cannot be priced");

            None
        }
    }
}
