//! Cart snapshots
//!
//! The whole cart is stored as a JSON array of line items under
//! [`CART_STORAGE_KEY`]. Snapshots written by the mobile client's persistence
//! middleware wrap the array as `{"state":{"items":[...]},"version":N}`;
//! those are accepted on read as well.
//!
//! Prices are written as JSON numbers with every decimal digit kept, so a
//! decoded cart equals the one that was encoded.

use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    items::CartItem,
};

/// Storage key holding the serialised cart.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Errors raised while encoding or decoding a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot was not valid JSON or did not match the line item shape.
    #[error("malformed cart snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot parsed but describes an invalid cart.
    #[error("invalid cart snapshot: {0}")]
    Cart(#[from] CartError),
}

#[derive(Deserialize)]
struct Envelope {
    state: EnvelopeState,
}

#[derive(Deserialize)]
struct EnvelopeState {
    items: Vec<CartItem>,
}

/// Serialise the lines of a cart.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialisation fails.
pub fn encode(items: &[CartItem]) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(items)?)
}

/// Rebuild a cart from a snapshot.
///
/// # Errors
///
/// Returns a [`SnapshotError`] if the text is not a snapshot or the lines
/// break the cart's invariants.
pub fn decode(text: &str) -> Result<Cart, SnapshotError> {
    // No untagged enum here: buffered input loses exact numbers.
    let items: Vec<CartItem> = if text.trim_start().starts_with('[') {
        serde_json::from_str(text)?
    } else {
        serde_json::from_str::<Envelope>(text)?.state.items
    };

    Ok(Cart::from_items(items)?)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::items::InvalidItemError;

    use super::*;

    fn sample_cart() -> TestResult<Cart> {
        let mut cart = Cart::new();

        cart.add_item(
            CartItem::product("product-1", "Targets", Decimal::new(1999, 2))
                .with_discount(Decimal::new(125, 1))
                .with_quantity(4)
                .with_image("https://cdn.example/targets.png")
                .with_catalog_id("1"),
        )?;
        cart.add_item(
            CartItem::service("service-9-1700000000000-0", "Instructor", Decimal::from(600))
                .with_duration(90)
                .with_master("Ivan")
                .with_schedule("2026-10-20T10:00:00Z"),
        )?;

        Ok(cart)
    }

    #[test]
    fn round_trip_preserves_items_and_order() -> TestResult {
        let cart = sample_cart()?;

        let restored = decode(&encode(cart.items())?)?;

        assert_eq!(restored, cart);

        Ok(())
    }

    #[test]
    fn round_trip_keeps_digits_beyond_float_precision() -> TestResult {
        let mut cart = Cart::new();
        cart.add_item(
            CartItem::product("product-1", "Targets", "123456789.0123456789".parse()?)
                .with_discount("33.33333333333333333".parse()?),
        )?;

        let text = encode(cart.items())?;
        let restored = decode(&text)?;

        assert!(text.contains("123456789.0123456789"), "price lost digits: {text}");
        assert_eq!(restored, cart);

        Ok(())
    }

    #[test]
    fn large_integer_prices_round_trip() -> TestResult {
        let mut cart = Cart::new();
        cart.add_item(CartItem::product(
            "product-1",
            "Lane lease",
            "30000000000000000000".parse()?,
        ))?;

        assert_eq!(decode(&encode(cart.items())?)?, cart);

        Ok(())
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        let text = r#"[
            {"id":"a","type":"product","name":"A","price":79000000000000000000000000000,"quantity":2}
        ]"#;

        assert!(matches!(
            decode(text),
            Err(SnapshotError::Cart(CartError::InvalidItem(
                InvalidItemError::TotalOutOfRange(_)
            )))
        ));
    }

    #[test]
    fn empty_cart_encodes_as_empty_array() -> TestResult {
        assert_eq!(encode(&[])?, "[]");
        assert!(decode("[]")?.is_empty());

        Ok(())
    }

    #[test]
    fn decodes_middleware_envelope() -> TestResult {
        let text = r#"{
            "state": {
                "items": [
                    {"id":"product-5","type":"product","name":"Gloves","price":350,"discountPercent":10,"quantity":2}
                ]
            },
            "version": 0
        }"#;

        let cart = decode(text)?;

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), Decimal::from(630));

        Ok(())
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode("not json"), Err(SnapshotError::Json(_))));
        assert!(matches!(decode(r#"{"items":1}"#), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn invalid_lines_are_rejected() {
        let text = r#"[
            {"id":"a","type":"product","name":"A","price":1,"quantity":1},
            {"id":"a","type":"product","name":"A","price":1,"quantity":1}
        ]"#;

        assert!(matches!(
            decode(text),
            Err(SnapshotError::Cart(CartError::DuplicateId(_)))
        ));
        assert!(matches!(
            decode(r#"[{"id":"a","type":"product","name":"A","price":1,"quantity":0}]"#),
            Err(SnapshotError::Cart(CartError::InvalidItem(_)))
        ));
    }
}
