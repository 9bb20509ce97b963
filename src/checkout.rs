//! Checkout
//!
//! Turns a cart into the payload accepted by the storefront's order endpoint
//! and submits it.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::Cart,
    items::{CartItem, ItemKind},
    pricing::discounted_unit_price,
};

/// Errors raised while building or submitting an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// The request could not be sent or its response could not be read.
    #[error("order request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with an error status.
    #[error("order endpoint returned {status}: {body}")]
    UnexpectedResponse {
        /// HTTP status code.
        status: u16,

        /// Response body, as text.
        body: String,
    },
}

/// The customer placing the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Backend user id.
    pub user_id: String,

    /// Loyalty discount applied to the whole order, in percent.
    pub discount_percent: Decimal,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Product or service.
    #[serde(rename = "type")]
    pub kind: ItemKind,

    /// Catalog id of the ordered entity.
    pub item_id: String,

    /// Display name.
    pub name: String,

    /// Unit price before discount.
    pub base_price: Decimal,

    /// Line discount in percent.
    pub item_discount_percent: Decimal,

    /// Number of units.
    pub quantity: u32,

    /// Service duration in minutes.
    pub duration: Option<u32>,

    /// Master running the service.
    pub master_name: Option<String>,

    /// Scheduled start of the service.
    pub date_time: Option<String>,

    /// Discounted line total.
    pub total_amount: Decimal,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            kind: item.kind,
            item_id: item.catalog_id.clone().unwrap_or_else(|| item.id.clone()),
            name: item.name.clone(),
            base_price: item.unit_price,
            item_discount_percent: item.discount_percent,
            quantity: item.quantity,
            duration: item.duration_minutes,
            master_name: item.master_name.clone(),
            date_time: item.scheduled_at.clone(),
            total_amount: item.line_total(),
        }
    }
}

/// Order creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    /// Backend user id.
    pub user_id: String,

    /// Ordered lines.
    pub items: Vec<OrderLine>,

    /// Cart total before the customer discount.
    pub total_amount: Decimal,

    /// Customer discount in percent.
    pub discount_percent: Decimal,
}

impl NewOrder {
    /// Build the payload for `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no lines.
    pub fn from_cart(cart: &Cart, customer: &Customer) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        Ok(Self {
            user_id: customer.user_id.clone(),
            items: cart.iter().map(OrderLine::from).collect(),
            total_amount: cart.total(),
            discount_percent: customer.discount_percent,
        })
    }

    /// Amounts shown to the customer before confirming.
    pub fn summary(&self) -> OrderSummary {
        OrderSummary::new(self.total_amount, self.discount_percent)
    }
}

/// Subtotal, customer discount and payable total of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    /// Cart total.
    pub subtotal: Decimal,

    /// Amount taken off by the customer discount.
    pub discount: Decimal,

    /// Amount payable.
    pub total: Decimal,
}

impl OrderSummary {
    /// Apply `discount_percent` to `subtotal`.
    pub fn new(subtotal: Decimal, discount_percent: Decimal) -> Self {
        let total = discounted_unit_price(subtotal, discount_percent);

        Self {
            subtotal,
            discount: subtotal.saturating_sub(total),
            total,
        }
    }
}

/// An order accepted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedOrder {
    /// Order id assigned by the backend.
    pub id: String,

    /// Initial order status.
    #[serde(default)]
    pub status: Option<String>,
}

/// Sends orders to the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Submit `order`.
    async fn submit(&self, order: &NewOrder) -> Result<CreatedOrder, CheckoutError>;
}

/// Submits orders to `{base_url}/api/orders`.
#[derive(Debug, Clone)]
pub struct HttpOrderSubmitter {
    base_url: String,
    http: Client,
}

impl HttpOrderSubmitter {
    /// Create a submitter for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/api/orders", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl OrderSubmitter for HttpOrderSubmitter {
    async fn submit(&self, order: &NewOrder) -> Result<CreatedOrder, CheckoutError> {
        let url = self.orders_url();
        debug!(%url, lines = order.items.len(), "submitting order");

        let response = self.http.post(&url).json(order).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            return Err(CheckoutError::UnexpectedResponse { status, body });
        }

        Ok(response.json().await?)
    }
}
