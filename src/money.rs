//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization. Amounts are rounded to 2 decimal
//! places, half-up.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item (R$1,000,000)
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: i64 = 9999;

/// Round a decimal to 2 places, half-up
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an f64 amount to Decimal; non-finite values collapse to zero
pub fn dec(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert a Decimal back to the f64 storage representation
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

/// Validate that an f64 amount is finite and non-negative
pub fn require_amount(value: f64, field_name: &str) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{field_name} must be a finite number, got {value}"));
    }
    if value < 0.0 {
        return Err(format!("{field_name} must be non-negative, got {value}"));
    }
    if value > MAX_PRICE {
        return Err(format!(
            "{field_name} exceeds maximum allowed ({MAX_PRICE}), got {value}"
        ));
    }
    Ok(())
}

/// Line subtotal: `quantity × unit_price − discount`, 2 dp
pub fn line_subtotal(unit_price: f64, quantity: i64, discount: f64) -> f64 {
    let value = dec(unit_price) * Decimal::from(quantity) - dec(discount);
    to_f64(value)
}

/// Order total: `subtotal + shipping − discount`, 2 dp
///
/// This is the only place the order-level invariant is computed; it is
/// enforced at creation and never recomputed implicitly.
pub fn order_total(subtotal: f64, shipping: f64, discount: f64) -> f64 {
    let value = dec(subtotal) + dec(shipping) - dec(discount);
    to_f64(value)
}

/// Sum of line subtotals, 2 dp
pub fn order_subtotal(lines: impl IntoIterator<Item = (f64, i64)>) -> f64 {
    let sum = lines
        .into_iter()
        .map(|(unit_price, quantity)| dec(unit_price) * Decimal::from(quantity))
        .sum::<Decimal>();
    to_f64(sum)
}
