//! Mathematical Utilities
//!
//! Exchange-rate conversions between the custody asset (underlying) and the
//! yield pool's receipt token. Rates are mantissas scaled by 1e18 and all
//! conversions truncate toward zero.

use crate::constants::precision::EXP_SCALE;
use crate::errors::{CustodyError, CustodyResult};

/// Convert an underlying amount into pool tokens at `exchange_rate`
///
/// tokens = amount * 1e18 / exchange_rate
pub fn underlying_to_pool_tokens(amount: u128, exchange_rate: u128) -> CustodyResult<u128> {
    amount
        .checked_mul(EXP_SCALE)
        .ok_or(CustodyError::Overflow)?
        .checked_div(exchange_rate)
        .ok_or(CustodyError::DivisionByZero)
}

/// Convert pool tokens into their underlying value at `exchange_rate`
///
/// underlying = tokens * exchange_rate / 1e18
pub fn pool_tokens_to_underlying(tokens: u128, exchange_rate: u128) -> CustodyResult<u128> {
    tokens
        .checked_mul(exchange_rate)
        .ok_or(CustodyError::Overflow)?
        .checked_div(EXP_SCALE)
        .ok_or(CustodyError::DivisionByZero)
}
