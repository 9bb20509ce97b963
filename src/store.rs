//! Cart store
//!
//! [`CartStore`] owns the authoritative [`Cart`] and is the only way to
//! mutate it. After every mutation it notifies its observers (persistence
//! among them) and refreshes the [`CartSummary`] published to subscribers.
//!
//! Stores are constructed explicitly; there is no process-wide instance.

use std::{fmt, sync::Arc};

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    cart::{AddOutcome, Cart, QuantityUpdate},
    checkout::{CheckoutError, CreatedOrder, Customer, NewOrder, OrderSubmitter},
    items::{CartItem, InvalidItemError},
    persist::{CartObserver, Persister},
    snapshot,
    storage::KeyValueStore,
};

/// Derived figures published to subscribers after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSummary {
    /// Number of distinct lines.
    pub lines: usize,

    /// Number of units across all lines.
    pub item_count: u64,

    /// Sum of discounted line totals.
    pub total: Decimal,
}

impl CartSummary {
    fn of(cart: &Cart) -> Self {
        Self {
            lines: cart.len(),
            item_count: cart.item_count(),
            total: cart.total(),
        }
    }
}

/// Owner of the cart.
pub struct CartStore {
    cart: Cart,
    observers: Vec<Arc<dyn CartObserver>>,
    summary: watch::Sender<CartSummary>,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create a store holding an empty cart and no observers.
    pub fn new() -> Self {
        Self::with_cart(Cart::new())
    }

    /// Create a store around an existing cart.
    pub fn with_cart(cart: Cart) -> Self {
        let (summary, _) = watch::channel(CartSummary::of(&cart));

        Self {
            cart,
            observers: Vec::new(),
            summary,
        }
    }

    /// Rehydrate the cart stored under `key` and persist every later change
    /// back to it.
    ///
    /// A missing, unreadable or corrupt snapshot yields an empty cart. Must
    /// be called from within a Tokio runtime.
    #[instrument(skip(storage))]
    pub async fn open(storage: Arc<dyn KeyValueStore>, key: &str) -> (Self, Arc<Persister>) {
        let cart = rehydrate(storage.as_ref(), key).await;
        let persister = Arc::new(Persister::spawn(storage, key));

        let mut store = Self::with_cart(cart);
        store.add_observer(Arc::clone(&persister) as Arc<dyn CartObserver>);

        (store, persister)
    }

    /// Register an observer called after every mutation.
    pub fn add_observer(&mut self, observer: Arc<dyn CartObserver>) {
        self.observers.push(observer);
    }

    /// Subscribe to summary updates.
    pub fn subscribe(&self) -> watch::Receiver<CartSummary> {
        self.summary.subscribe()
    }

    /// Add an item, merging products that are already in the cart.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidItemError`] if the item is rejected; the cart is
    /// left unchanged and observers are not notified.
    pub fn add_item(&mut self, item: CartItem) -> Result<AddOutcome, InvalidItemError> {
        let id = item.id.clone();

        let outcome = self.cart.add_item(item).inspect_err(|error| {
            warn!(id = %id, error = %error, "rejected cart item");
        })?;

        debug!(id = %id, ?outcome, "added cart item");
        self.changed();

        Ok(outcome)
    }

    /// Remove a line. Removing a missing line is a no-op and notifies
    /// nobody.
    pub fn remove_item(&mut self, id: &str) -> Option<CartItem> {
        let removed = self.cart.remove_item(id);

        debug!(id, removed = removed.is_some(), "removed cart item");

        if removed.is_some() {
            self.changed();
        }

        removed
    }

    /// Set a line's quantity; zero or below removes the line.
    ///
    /// Observers are only notified when a line was updated or removed.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> QuantityUpdate {
        let update = self.cart.update_quantity(id, quantity);

        match update {
            QuantityUpdate::Set | QuantityUpdate::Removed(_) => {
                debug!(id, quantity, ?update, "updated cart quantity");
                self.changed();
            }
            QuantityUpdate::OutOfRange => {
                warn!(id, quantity, "refused quantity, cart total would overflow");
            }
            QuantityUpdate::NotFound => debug!(id, "no line to update"),
        }

        update
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) {
        self.cart.clear();

        debug!("cleared cart");
        self.changed();
    }

    /// The lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    /// Sum of discounted line totals.
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    /// Number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Read access to the cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Submit the cart as an order, clearing it once the order is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart, or the
    /// submitter's error; in both cases the cart is left untouched.
    pub async fn checkout<S>(
        &mut self,
        submitter: &S,
        customer: &Customer,
    ) -> Result<CreatedOrder, CheckoutError>
    where
        S: OrderSubmitter + ?Sized,
    {
        let order = NewOrder::from_cart(&self.cart, customer)?;
        let created = submitter.submit(&order).await?;

        info!(order_id = %created.id, total = %order.total_amount, "order created");
        self.clear_cart();

        Ok(created)
    }

    fn changed(&self) {
        let items = self.cart.items();

        for observer in &self.observers {
            observer.on_change(items);
        }

        self.summary.send_replace(CartSummary::of(&self.cart));
    }
}

async fn rehydrate(storage: &dyn KeyValueStore, key: &str) -> Cart {
    let text = match storage.get(key).await {
        Ok(Some(text)) => text,
        Ok(None) => return Cart::new(),
        Err(error) => {
            warn!(key, error = %error, "failed to read stored cart, starting empty");
            return Cart::new();
        }
    };

    match snapshot::decode(&text) {
        Ok(cart) => {
            debug!(key, lines = cart.len(), "rehydrated cart");
            cart
        }
        Err(error) => {
            warn!(key, error = %error, "discarding corrupt stored cart");
            Cart::new()
        }
    }
}
