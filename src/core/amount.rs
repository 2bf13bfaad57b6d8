//! Denomination helpers
//!
//! Balances are stored in the smallest unit: `amount × 10^decimals`.

use thiserror::Error;

/// Decimal precision of the Karbun token
pub const DECIMALS: u8 = 18;

/// One whole token in smallest units
pub const ONE_TOKEN: u128 = 10u128.pow(DECIMALS as u32);

/// Fixed supply minted to the deployer: 321 million whole tokens
pub const INITIAL_SUPPLY: u128 = 321_000_000 * ONE_TOKEN;

/// Amount parsing errors
#[derive(Error, Debug, PartialEq)]
pub enum AmountError {
    #[error("Invalid amount: {0}")]
    Invalid(String),
    #[error("Too many decimal places: {got} (max {max})")]
    TooPrecise { got: usize, max: u8 },
    #[error("Amount overflows u128")]
    Overflow,
}

/// Parse a human-readable amount (e.g. `"10"` or `"1.25"`) into smallest units
pub fn parse_units(value: &str, decimals: u8) -> Result<u128, AmountError> {
    let value = value.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Invalid(value.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountError::Invalid(value.to_string()));
    }
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooPrecise {
            got: fraction.len(),
            max: decimals,
        });
    }

    let scale = 10u128
        .checked_pow(decimals as u32)
        .ok_or(AmountError::Overflow)?;

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };

    // Right-pad the fraction to `decimals` digits
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse().map_err(|_| AmountError::Overflow)?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

/// Format smallest units as a human-readable amount, trimming trailing zeros
pub fn format_units(value: u128, decimals: u8) -> String {
    let Some(scale) = 10u128.checked_pow(decimals as u32) else {
        return value.to_string();
    };

    let whole = value / scale;
    let fraction = value % scale;

    if fraction == 0 {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
