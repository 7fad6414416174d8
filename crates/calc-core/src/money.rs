//! Decimal rounding and fixed-precision formatting.
//!
//! Engines keep full precision internally; these helpers are applied only where
//! a value leaves the engine (tax payable, wire output).

use crate::error::{CalcError, CalcResult};
use rust_decimal::{Decimal, RoundingStrategy};

/// Minor-unit scale for GBP/USD amounts.
pub const MONEY_SCALE: u32 = 2;
/// Scale used when presenting share quantities.
pub const SHARE_SCALE: u32 = 4;
/// Scale used when presenting percentages.
pub const PERCENT_SCALE: u32 = 2;

/// Round half-to-even and pad to exactly `scale` decimal places.
pub fn quantize(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(scale);
    rounded
}

/// Round a monetary amount to the currency's minor unit.
pub fn quantize_money(value: Decimal) -> Decimal {
    quantize(value, MONEY_SCALE)
}

/// Format a monetary amount as a fixed-precision string, e.g. `"998.00"`.
pub fn format_money(value: Decimal) -> String {
    quantize(value, MONEY_SCALE).to_string()
}

/// Format a share quantity with four decimal places.
pub fn format_shares(value: Decimal) -> String {
    quantize(value, SHARE_SCALE).to_string()
}

pub fn format_percent(value: Decimal) -> String {
    quantize(value, PERCENT_SCALE).to_string()
}

/// `a * b`, failing instead of panicking when the product overflows.
pub fn try_mul(a: Decimal, b: Decimal) -> CalcResult<Decimal> {
    a.checked_mul(b).ok_or_else(CalcError::out_of_range)
}

pub fn try_add(a: Decimal, b: Decimal) -> CalcResult<Decimal> {
    a.checked_add(b).ok_or_else(CalcError::out_of_range)
}

pub fn try_sub(a: Decimal, b: Decimal) -> CalcResult<Decimal> {
    a.checked_sub(b).ok_or_else(CalcError::out_of_range)
}

/// `a / b`. Callers check for a zero divisor themselves; this only guards
/// against a quotient too large to represent.
pub fn try_div(a: Decimal, b: Decimal) -> CalcResult<Decimal> {
    a.checked_div(b).ok_or_else(CalcError::out_of_range)
}

/// Sum of `values`, failing on overflow.
pub fn try_sum<I>(values: I) -> CalcResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, try_add)
}
