//! Decimal amount and price utilities.
//!
//! ## Overview
//!
//! Amounts, prices and balances are exact `rust_decimal::Decimal` values.
//! Monetary arithmetic never goes through floating point.
//!
//! ## Amount Scale
//!
//! Crypto amounts are quantized to [`AMOUNT_SCALE`] decimal places (10^-8,
//! one satoshi) wherever a division produces them. Flooring, not rounding,
//! keeps `amount * price` within the fiat balance it was derived from.
//!
//! ## Examples
//!
//! ```
//! use order_allocator::types::amount::{floor_to_scale, parse_amount, AMOUNT_SCALE};
//! use rust_decimal::Decimal;
//!
//! let funds = parse_amount("100").unwrap();
//! let price = parse_amount("3").unwrap();
//! let bound = floor_to_scale(funds / price, AMOUNT_SCALE);
//! assert_eq!(bound.to_string(), "33.33333333");
//! assert!(bound * price <= funds);
//! ```

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Default number of decimal places for crypto amounts (1 satoshi)
pub const AMOUNT_SCALE: u32 = 8;

/// Largest scale `rust_decimal` can represent
pub const MAX_SCALE: u32 = 28;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Parse a decimal string
///
/// # Returns
///
/// * `Some(Decimal)` - The parsed value
/// * `None` - If parsing fails
///
/// # Example
///
/// ```
/// use order_allocator::types::amount::parse_amount;
///
/// assert!(parse_amount("50000.12345678").is_some());
/// assert!(parse_amount("abc").is_none());
/// ```
pub fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok()
}

/// Truncate a value toward zero to `scale` decimal places
pub fn floor_to_scale(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale.min(MAX_SCALE), RoundingStrategy::ToZero)
}

/// Render a value without trailing zeros
///
/// # Example
///
/// ```
/// use order_allocator::types::amount::display_trimmed;
/// use rust_decimal::Decimal;
///
/// assert_eq!(display_trimmed(Decimal::new(150, 2)), "1.5");
/// assert_eq!(display_trimmed(Decimal::new(30, 1)), "3");
/// ```
pub fn display_trimmed(value: Decimal) -> String {
    value.normalize().to_string()
}

// ============================================================================
// Arithmetic Functions
// ============================================================================

/// Money moved for `amount` units at `price`
///
/// # Returns
///
/// * `Some(Decimal)` - `amount * price`
/// * `None` - If the product overflows
pub fn checked_value(amount: Decimal, price: Decimal) -> Option<Decimal> {
    amount.checked_mul(price)
}

/// Units of crypto that `funds` can pay for at `price`, floored to `scale`
///
/// # Returns
///
/// * `Some(Decimal)` - The affordable amount
/// * `None` - If the price is not positive or the division overflows
pub fn affordable_amount(funds: Decimal, price: Decimal, scale: u32) -> Option<Decimal> {
    if price <= Decimal::ZERO {
        return None;
    }

    let raw = funds.checked_div(price)?;
    Some(floor_to_scale(raw, scale))
}

// ============================================================================
// Unit Tests
// ============================================================================
