//! Conversion Engine: native value + oracle price → settlement allocation.
//!
//! All multiplications are grouped before the single division so no
//! intermediate truncation loses precision:
//!
//! ```text
//! numerator   = value · price · 10^allocation_decimals · 10^unit_price_decimals
//! denominator = 10^value_decimals · 10^price_decimals · unit_price
//! allocation  = ⌊numerator / denominator⌋
//! ```
//!
//! Arithmetic runs in `u128`; every step is checked and maps to
//! [`EscrowError::Overflow`].

use ondrix_types::{ConversionRate, EscrowError, Result};

fn pow10(exp: u32) -> Result<u128> {
    10u128.checked_pow(exp).ok_or(EscrowError::Overflow)
}

/// Allocation owed for `value` at `price`.
///
/// # Errors
/// - `InvalidPrice` if `price` is zero
/// - `Overflow` if the scaled product or the result does not fit
/// - `PrecisionTooSmall` if the allocation rounds down to zero
pub fn convert(value: u64, price: u64, rate: &ConversionRate) -> Result<u64> {
    if price == 0 {
        return Err(EscrowError::InvalidPrice {
            reason: "price must be positive".into(),
        });
    }
    if rate.unit_price == 0 {
        return Err(EscrowError::Configuration("unit price must be positive".into()));
    }

    // u64 × u64 always fits in u128; only the scaling steps can overflow.
    let gross = u128::from(value) * u128::from(price);

    let allocation_scale = pow10(rate.allocation_decimals)?
        .checked_mul(pow10(rate.unit_price_decimals)?)
        .ok_or(EscrowError::Overflow)?;
    let numerator = gross
        .checked_mul(allocation_scale)
        .ok_or(EscrowError::Overflow)?;
    let denominator = pow10(rate.value_decimals)?
        .checked_mul(pow10(rate.price_decimals)?)
        .and_then(|d| d.checked_mul(u128::from(rate.unit_price)))
        .ok_or(EscrowError::Overflow)?;

    let allocation = numerator / denominator;
    if allocation == 0 {
        return Err(EscrowError::PrecisionTooSmall);
    }
    u64::try_from(allocation).map_err(|_| EscrowError::Overflow)
}

/// Exact partition of a deposit into its two halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositSplit {
    /// Queued for the recipient right away: `⌊value / 2⌋`.
    pub immediate: u64,
    /// Held until the global unlock: `value − immediate`.
    pub locked: u64,
}

/// `immediate + locked == value` for every input.
#[must_use]
pub fn split_deposit(value: u64) -> DepositSplit {
    let immediate = value / 2;
    DepositSplit {
        immediate,
        locked: value - immediate,
    }
}

/// Value-weighted average of a running price and a new observation.
///
/// ```text
/// (avg · weight + price · value) / (weight + value)
/// ```
///
/// With `weight == 0` the new price is returned unchanged.
pub fn weighted_average_price(avg: u64, weight: u64, price: u64, value: u64) -> Result<u64> {
    let total_weight = u128::from(weight) + u128::from(value);
    if total_weight == 0 {
        return Ok(price);
    }
    let weighted = u128::from(avg)
        .checked_mul(u128::from(weight))
        .and_then(|a| a.checked_add(u128::from(price).checked_mul(u128::from(value))?))
        .ok_or(EscrowError::Overflow)?;
    u64::try_from(weighted / total_weight).map_err(|_| EscrowError::Overflow)
}
