//! Range Cart
//!
//! Client-side shopping cart for a shooting-range storefront: products and
//! bookable services, merge rules, discounted totals, transparent
//! persistence to a key-value store, and order checkout.

pub mod cart;
pub mod checkout;
pub mod items;
pub mod persist;
pub mod prelude;
pub mod pricing;
pub mod settings;
pub mod snapshot;
pub mod storage;
pub mod store;
