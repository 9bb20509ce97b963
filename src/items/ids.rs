//! Line ids
//!
//! Products are keyed by their catalog id so that repeated adds merge into a
//! single line. Services get a fresh id per add, salted with the current time
//! and a per-minter sequence number.

use std::sync::atomic::{AtomicU64, Ordering};

use jiff::Timestamp;

use super::ItemKind;

/// Mints line ids for items about to be added to a cart.
#[derive(Debug, Default)]
pub struct LineIdMinter {
    sequence: AtomicU64,
}

impl LineIdMinter {
    /// Creates a minter starting at sequence 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable id for a product, shared by every add of the same catalog entry.
    pub fn product(&self, catalog_id: &str) -> String {
        format!("{}-{catalog_id}", ItemKind::Product.as_str())
    }

    /// Fresh id for a service booking.
    pub fn service(&self, catalog_id: &str) -> String {
        self.service_at(catalog_id, Timestamp::now())
    }

    /// Fresh id for a service booking, salted with the given time.
    pub fn service_at(&self, catalog_id: &str, now: Timestamp) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);

        format!(
            "{}-{catalog_id}-{}-{seq}",
            ItemKind::Service.as_str(),
            now.as_millisecond()
        )
    }

    /// Mints the id appropriate for `kind`.
    pub fn mint(&self, kind: ItemKind, catalog_id: &str) -> String {
        match kind {
            ItemKind::Product => self.product(catalog_id),
            ItemKind::Service => self.service(catalog_id),
        }
    }
}
