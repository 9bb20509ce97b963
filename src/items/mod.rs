//! Items

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{checked_line_total, discounted_unit_price};

pub mod ids;

pub use ids::LineIdMinter;

/// Upper bound for a percentage discount.
const MAX_DISCOUNT_PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Reasons a line item is refused by the cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidItemError {
    /// The line id was empty.
    #[error("item id must not be empty")]
    EmptyId,

    /// The display name was empty or only whitespace (line id).
    #[error("item {0} has an empty name")]
    EmptyName(String),

    /// The quantity was zero (line id).
    #[error("item {0} must have a quantity of at least 1")]
    ZeroQuantity(String),

    /// The unit price was negative (line id, price).
    #[error("item {0} has a negative price {1}")]
    NegativePrice(String, Decimal),

    /// The discount was outside `0..=100` (line id, discount).
    #[error("item {0} has discount {1}%, expected a value between 0 and 100")]
    DiscountOutOfRange(String, Decimal),

    /// The line id is already used by a line the item cannot merge into.
    #[error("line id {0} is already in the cart")]
    DuplicateId(String),

    /// The line total, or the cart total with this line, would not fit in a
    /// `Decimal` (line id).
    #[error("item {0} would push the cart total out of range")]
    TotalOutOfRange(String),
}

/// What kind of catalog entity a line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A physical product; repeated adds merge into one line.
    Product,

    /// A bookable service; every add is its own line.
    Service,
}

impl ItemKind {
    /// Lowercase name, as used in line ids and order payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Product => "product",
            ItemKind::Service => "service",
        }
    }
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Unique line id within the cart.
    pub id: String,

    /// Product or service.
    #[serde(rename = "type")]
    pub kind: ItemKind,

    /// Display name.
    pub name: String,

    /// Price of one unit before discount.
    #[serde(rename = "price")]
    pub unit_price: Decimal,

    /// Discount in percent, `0..=100`.
    #[serde(default)]
    pub discount_percent: Decimal,

    /// Number of units.
    pub quantity: u32,

    /// Image reference, display only.
    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,

    /// Booked duration of a service, in minutes.
    #[serde(rename = "duration", default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,

    /// Name of the master running a service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_name: Option<String>,

    /// Scheduled start of a service.
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,

    /// Id of the catalog entity this line was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
}

impl CartItem {
    /// Creates a product line with a quantity of 1 and no discount.
    pub fn product(id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self::new(id, ItemKind::Product, name, unit_price)
    }

    /// Creates a service line with a quantity of 1 and no discount.
    pub fn service(id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self::new(id, ItemKind::Service, name, unit_price)
    }

    fn new(
        id: impl Into<String>,
        kind: ItemKind,
        name: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            unit_price,
            discount_percent: Decimal::ZERO,
            quantity: 1,
            image_ref: None,
            duration_minutes: None,
            master_name: None,
            scheduled_at: None,
            catalog_id: None,
        }
    }

    /// Sets the quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the discount percentage.
    #[must_use]
    pub fn with_discount(mut self, percent: Decimal) -> Self {
        self.discount_percent = percent;
        self
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image_ref = Some(image.into());
        self
    }

    /// Sets the service duration in minutes.
    #[must_use]
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Sets the master name.
    #[must_use]
    pub fn with_master(mut self, master: impl Into<String>) -> Self {
        self.master_name = Some(master.into());
        self
    }

    /// Sets the scheduled start.
    #[must_use]
    pub fn with_schedule(mut self, at: impl Into<String>) -> Self {
        self.scheduled_at = Some(at.into());
        self
    }

    /// Sets the source catalog id.
    #[must_use]
    pub fn with_catalog_id(mut self, catalog_id: impl Into<String>) -> Self {
        self.catalog_id = Some(catalog_id.into());
        self
    }

    /// Price of one unit after the line discount.
    pub fn discounted_unit_price(&self) -> Decimal {
        discounted_unit_price(self.unit_price, self.discount_percent)
    }

    /// Discounted unit price multiplied by the quantity.
    ///
    /// Saturates at [`Decimal::MAX`]; validated items never reach it.
    pub fn line_total(&self) -> Decimal {
        self.checked_line_total().unwrap_or(Decimal::MAX)
    }

    /// Discounted unit price multiplied by the quantity, or `None` if it
    /// overflows.
    pub fn checked_line_total(&self) -> Option<Decimal> {
        checked_line_total(self.unit_price, self.discount_percent, self.quantity)
    }

    /// Checks the item against the cart's contract.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidItemError`] found.
    pub fn validate(&self) -> Result<(), InvalidItemError> {
        if self.id.is_empty() {
            return Err(InvalidItemError::EmptyId);
        }

        if self.name.trim().is_empty() {
            return Err(InvalidItemError::EmptyName(self.id.clone()));
        }

        if self.quantity == 0 {
            return Err(InvalidItemError::ZeroQuantity(self.id.clone()));
        }

        if self.unit_price < Decimal::ZERO {
            return Err(InvalidItemError::NegativePrice(
                self.id.clone(),
                self.unit_price,
            ));
        }

        if self.discount_percent < Decimal::ZERO || self.discount_percent > MAX_DISCOUNT_PERCENT {
            return Err(InvalidItemError::DiscountOutOfRange(
                self.id.clone(),
                self.discount_percent,
            ));
        }

        if self.checked_line_total().is_none() {
            return Err(InvalidItemError::TotalOutOfRange(self.id.clone()));
        }

        Ok(())
    }
}
