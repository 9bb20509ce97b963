//! Cart table rendering

use std::io;

use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};

use range_cart::{
    checkout::OrderSummary,
    items::{CartItem, ItemKind},
    pricing::format_amount,
    store::CartStore,
};

/// Write the cart as a table followed by its totals.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_cart(out: &mut impl io::Write, store: &CartStore) -> io::Result<()> {
    if store.items().is_empty() {
        return writeln!(out, "Cart is empty");
    }

    let mut builder = Builder::default();
    builder.push_record(["Line", "Item", "Details", "Qty", "Price", "Total"]);

    for item in store.items() {
        builder.push_record([
            item.id.clone(),
            item.name.clone(),
            details(item),
            item.quantity.to_string(),
            price(item),
            format_amount(item.line_total()),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..), Alignment::right());
    table.modify(Rows::first(), Alignment::center());

    writeln!(out, "{table}")?;
    writeln!(out, "Items: {}", store.item_count())?;
    writeln!(out, "Total: {}", format_amount(store.total()))
}

/// Write the subtotal, customer discount and payable total.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_summary(out: &mut impl io::Write, summary: &OrderSummary) -> io::Result<()> {
    writeln!(out, "Subtotal: {}", format_amount(summary.subtotal))?;

    if summary.discount > Decimal::ZERO {
        writeln!(out, "Discount: -{}", format_amount(summary.discount))?;
    }

    writeln!(out, "Total:    {}", format_amount(summary.total))
}

fn details(item: &CartItem) -> String {
    let mut parts = Vec::new();

    if item.kind == ItemKind::Service {
        if let Some(minutes) = item.duration_minutes {
            parts.push(format!("{minutes} min"));
        }

        if let Some(master) = &item.master_name {
            parts.push(master.clone());
        }

        if let Some(at) = &item.scheduled_at {
            parts.push(at.clone());
        }
    }

    parts.join(", ")
}

fn price(item: &CartItem) -> String {
    if item.discount_percent.is_zero() {
        return format_amount(item.unit_price);
    }

    format!(
        "{} (-{}%)",
        format_amount(item.discounted_unit_price()),
        item.discount_percent.normalize()
    )
}
