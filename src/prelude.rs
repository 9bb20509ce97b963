//! Range Cart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{AddOutcome, Cart, CartError, QuantityUpdate},
    checkout::{
        CheckoutError, CreatedOrder, Customer, HttpOrderSubmitter, NewOrder, OrderLine,
        OrderSubmitter, OrderSummary,
    },
    items::{CartItem, InvalidItemError, ItemKind, LineIdMinter},
    persist::{CartObserver, PersistError, PersistStatus, Persister},
    pricing::{format_amount, service_price},
    settings::{API_URL_KEY, ApiConfig, ConfigError, default_api_url},
    snapshot::{CART_STORAGE_KEY, SnapshotError},
    storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError},
    store::{CartStore, CartSummary},
};
