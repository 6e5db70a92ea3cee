//! Parsing of free-text answers given during a purchase conversation

use rust_decimal::Decimal;
use std::str::FromStr;

/// Sentinel that cancels the active conversation
pub const STOP_COMMAND: &str = "/stop";

/// Exact, case-insensitive match of the stop sentinel (surrounding whitespace ignored)
pub fn is_stop(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(STOP_COMMAND)
}

/// Parse a unit price. A decimal comma is accepted; the value must be positive.
pub fn parse_price(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', ".");
    let price = Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()?;
    (price > Decimal::ZERO).then(|| price.normalize())
}

/// Parse a purchased quantity: a positive whole number of units.
pub fn parse_quantity(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|q| *q > 0)
}
