//! Shared error taxonomy and decimal helpers for the calculator crates.

pub mod error;
pub mod money;

pub use error::*;
pub use money::{
    format_money, format_percent, format_shares, quantize, quantize_money, try_add, try_div,
    try_mul, try_sub, try_sum, MONEY_SCALE, PERCENT_SCALE, SHARE_SCALE,
};
