//! Pricing

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso};

use crate::items::CartItem;

const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Applies a percentage discount to a unit price.
///
/// `percent` is expressed in the `0..=100` range. No rounding is applied
/// unless `price * percent` leaves the `Decimal` range, in which case the
/// price is scaled down first. Out-of-range inputs saturate.
pub fn discounted_unit_price(price: Decimal, percent: Decimal) -> Decimal {
    let discount = match price.checked_mul(percent) {
        Some(scaled) => scaled / Decimal::ONE_HUNDRED,
        None => (price / Decimal::ONE_HUNDRED).saturating_mul(percent),
    };

    price.saturating_sub(discount)
}

/// Discounted unit price times `quantity`, or `None` if it overflows.
pub fn checked_line_total(price: Decimal, percent: Decimal, quantity: u32) -> Option<Decimal> {
    discounted_unit_price(price, percent).checked_mul(Decimal::from(quantity))
}

/// Sum of every line's discounted unit price times its quantity, or `None`
/// if any line or the sum overflows.
///
/// The per-unit discount is applied before multiplying by the quantity.
pub fn checked_total_price<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> Option<Decimal> {
    items
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.checked_line_total()?))
}

/// Like [`checked_total_price`], saturating at [`Decimal::MAX`].
///
/// Carts never hold lines whose total overflows, so this only saturates for
/// item lists built outside a cart.
pub fn total_price<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> Decimal {
    checked_total_price(items).unwrap_or(Decimal::MAX)
}

/// Number of units across all lines.
pub fn item_count<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> u64 {
    items
        .into_iter()
        .map(|item| u64::from(item.quantity))
        .sum()
}

/// Price of a service booking.
///
/// Services priced by the hour scale linearly with the booked minutes;
/// everything else costs the flat price.
pub fn service_price(price: Decimal, minutes: u32, depends_on_duration: bool) -> Decimal {
    if depends_on_duration {
        price * Decimal::from(minutes) / MINUTES_PER_HOUR
    } else {
        price
    }
}

/// Converts an amount to hryvnia, rounded to whole units for display.
pub fn to_money(amount: Decimal) -> Money<'static, iso::Currency> {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    Money::from_decimal(rounded, iso::UAH)
}

/// Formats an amount the way the storefront displays prices, e.g. `230 грн`.
pub fn format_amount(amount: Decimal) -> String {
    format!("{} грн", to_money(amount).amount().normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_items() -> [CartItem; 2] {
        [
            CartItem::product("p1", "Targets", Decimal::from(100))
                .with_discount(Decimal::from(10))
                .with_quantity(2),
            CartItem::product("p2", "Ear plugs", Decimal::from(50)),
        ]
    }

    #[test]
    fn discounted_unit_price_applies_percentage() {
        assert_eq!(
            discounted_unit_price(Decimal::from(200), Decimal::from(25)),
            Decimal::from(150)
        );
        assert_eq!(
            discounted_unit_price(Decimal::from(200), Decimal::ZERO),
            Decimal::from(200)
        );
        assert_eq!(
            discounted_unit_price(Decimal::from(200), Decimal::ONE_HUNDRED),
            Decimal::ZERO
        );
    }

    #[test]
    fn total_price_sums_discounted_lines() {
        assert_eq!(total_price(&test_items()), Decimal::from(230));
    }

    #[test]
    fn total_price_keeps_fractions() {
        let items = [CartItem::product("p1", "Pellets", Decimal::from(99))
            .with_discount(Decimal::from(15))
            .with_quantity(3)];

        // 99 * 0.85 * 3
        assert_eq!(total_price(&items), Decimal::new(25245, 2));
    }

    #[test]
    fn discount_on_huge_prices_does_not_overflow() {
        let price = Decimal::MAX;

        assert_eq!(discounted_unit_price(price, Decimal::ZERO), price);
        assert!(discounted_unit_price(price, Decimal::from(10)) < price);
        assert_eq!(discounted_unit_price(price, Decimal::ONE_HUNDRED), Decimal::ZERO);
    }

    #[test]
    fn line_total_overflow_is_detected() {
        assert_eq!(checked_line_total(Decimal::MAX, Decimal::ZERO, 2), None);
        assert_eq!(
            checked_line_total(Decimal::from(200), Decimal::from(50), 3),
            Some(Decimal::from(300))
        );
    }

    #[test]
    fn total_overflow_is_detected_across_lines() {
        let half = Decimal::MAX / Decimal::TWO + Decimal::ONE;
        let items = [
            CartItem::product("p1", "A", half),
            CartItem::product("p2", "B", half),
        ];

        assert_eq!(checked_total_price(&items), None);
        assert_eq!(total_price(&items), Decimal::MAX);
    }

    #[test]
    fn empty_totals_are_zero() {
        let items: [CartItem; 0] = [];

        assert_eq!(total_price(&items), Decimal::ZERO);
        assert_eq!(item_count(&items), 0);
    }

    #[test]
    fn item_count_counts_units() {
        assert_eq!(item_count(&test_items()), 3);
    }

    #[test]
    fn service_price_scales_with_duration() {
        let hourly = Decimal::from(600);

        assert_eq!(service_price(hourly, 90, true), Decimal::from(900));
        assert_eq!(service_price(hourly, 90, false), hourly);
    }

    #[test]
    fn format_amount_rounds_to_whole_hryvnia() {
        assert_eq!(format_amount(Decimal::new(25245, 2)), "252 грн");
        assert_eq!(format_amount(Decimal::new(2505, 1)), "251 грн");
        assert_eq!(format_amount(Decimal::from(230)), "230 грн");
    }
}
