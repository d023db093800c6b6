//! Oracle price types.
//!
//! A [`RawPrice`] is what a feed reports; a [`PriceObservation`] is a raw
//! price that passed validation and freshness checks. Observations are read
//! fresh on every deposit and never cached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unvalidated feed answer. The answer is signed because feeds can report
/// zero or negative values on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrice {
    pub answer: i128,
    /// Unix seconds at which the feed observed this answer.
    pub observed_at: i64,
}

/// A validated, positive price observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: u64,
    pub observed_at: i64,
}

impl PriceObservation {
    /// Age of this observation at `now`. Observations stamped in the future
    /// (feed clock ahead of ours) have age zero.
    #[must_use]
    pub fn age_at(&self, now: i64) -> u64 {
        u64::try_from(now.saturating_sub(self.observed_at)).unwrap_or(0)
    }

    /// Price rendered with the feed's decimals (e.g. `217.00000000`).
    #[must_use]
    pub fn to_decimal(&self, price_decimals: u32) -> Decimal {
        Decimal::try_from_i128_with_scale(i128::from(self.price), price_decimals)
            .unwrap_or_default()
    }
}
