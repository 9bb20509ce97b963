//! Cart

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{
    items::{CartItem, InvalidItemError, ItemKind},
    pricing::{checked_total_price, item_count, total_price},
};

/// Errors related to cart construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// An item failed validation.
    #[error(transparent)]
    InvalidItem(#[from] InvalidItemError),

    /// Two lines share the same id.
    #[error("duplicate line id {0}")]
    DuplicateId(String),

    /// The lines' combined total does not fit in a `Decimal`.
    #[error("cart total is out of range")]
    TotalOutOfRange,
}

/// Result of adding an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The quantity was folded into the existing product line at this index.
    Merged(usize),

    /// The item was appended as a new line at this index.
    Appended(usize),
}

/// Result of a quantity update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// The line now has the requested quantity.
    Set,

    /// The requested quantity was not positive, so the line was removed.
    Removed(CartItem),

    /// The quantity would push the line or cart total out of range; the
    /// line is unchanged.
    OutOfRange,

    /// No line has that id.
    NotFound,
}

/// Ordered collection of line items keyed by line id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cart from existing lines, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if a line is invalid or two lines share an id.
    pub fn from_items(items: impl Into<Vec<CartItem>>) -> Result<Self, CartError> {
        let items = items.into();
        let mut seen = FxHashSet::default();

        for item in &items {
            item.validate()?;

            if !seen.insert(item.id.as_str()) {
                return Err(CartError::DuplicateId(item.id.clone()));
            }
        }

        if checked_total_price(&items).is_none() {
            return Err(CartError::TotalOutOfRange);
        }

        Ok(Self { items })
    }

    /// Add an item.
    ///
    /// A product whose id matches an existing product line increases that
    /// line's quantity and leaves its other fields untouched. Any other item
    /// is appended as a new line.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidItemError`] and leaves the cart unchanged if the
    /// item fails validation, if its id is already taken by a line it
    /// cannot merge with, or if the cart total would overflow.
    pub fn add_item(&mut self, item: CartItem) -> Result<AddOutcome, InvalidItemError> {
        item.validate()?;

        let Some(index) = self.items.iter().position(|line| line.id == item.id) else {
            if self.total_with(None, &item).is_none() {
                return Err(InvalidItemError::TotalOutOfRange(item.id));
            }

            self.items.push(item);
            return Ok(AddOutcome::Appended(self.items.len() - 1));
        };

        let merged = match self.items.get(index) {
            Some(line) if line.kind == ItemKind::Product && item.kind == ItemKind::Product => line
                .quantity
                .checked_add(item.quantity)
                .map(|quantity| CartItem {
                    quantity,
                    ..line.clone()
                }),
            _ => return Err(InvalidItemError::DuplicateId(item.id)),
        };

        let Some(merged) = merged.filter(|merged| self.total_with(Some(index), merged).is_some())
        else {
            return Err(InvalidItemError::TotalOutOfRange(item.id));
        };

        if let Some(line) = self.items.get_mut(index) {
            *line = merged;
        }

        Ok(AddOutcome::Merged(index))
    }

    /// Remove the line with the given id, returning it if it was present.
    pub fn remove_item(&mut self, id: &str) -> Option<CartItem> {
        let index = self.items.iter().position(|line| line.id == id)?;

        Some(self.items.remove(index))
    }

    /// Set a line's quantity, removing the line when `quantity <= 0`.
    ///
    /// Quantities above `u32::MAX` are clamped. A quantity that would push
    /// the cart total out of range is refused.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> QuantityUpdate {
        if quantity <= 0 {
            return self
                .remove_item(id)
                .map_or(QuantityUpdate::NotFound, QuantityUpdate::Removed);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let Some((index, line)) = self.items.iter().enumerate().find(|(_, line)| line.id == id)
        else {
            return QuantityUpdate::NotFound;
        };

        let updated = CartItem {
            quantity,
            ..line.clone()
        };

        if self.total_with(Some(index), &updated).is_none() {
            return QuantityUpdate::OutOfRange;
        }

        if let Some(line) = self.items.get_mut(index) {
            *line = updated;
        }

        QuantityUpdate::Set
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of discounted line totals.
    pub fn total(&self) -> Decimal {
        total_price(&self.items)
    }

    /// Number of units across all lines.
    pub fn item_count(&self) -> u64 {
        item_count(&self.items)
    }

    /// Get a line by id.
    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|line| line.id == id)
    }

    /// The lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total after replacing the line at `replacing` with `line`, or
    /// appending it when `replacing` is `None`.
    fn total_with(&self, replacing: Option<usize>, line: &CartItem) -> Option<Decimal> {
        let kept = self
            .items
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != replacing)
            .map(|(_, kept)| kept);

        checked_total_price(kept.chain(std::iter::once(line)))
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
