//! Configuration types for an Ondrix engine deployment.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EscrowError, OracleId, Result, constants};

/// Fixed-point scales of the value → allocation conversion.
///
/// ```text
/// allocation = value · price · 10^allocation_decimals · 10^unit_price_decimals
///            / (10^value_decimals · 10^price_decimals · unit_price)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRate {
    /// Decimals of the deposited native value.
    pub value_decimals: u32,
    /// Decimals of the oracle price.
    pub price_decimals: u32,
    /// Decimals of the settlement asset.
    pub allocation_decimals: u32,
    /// Price of one whole allocation unit, scaled by `unit_price_decimals`.
    pub unit_price: u64,
    pub unit_price_decimals: u32,
}

impl ConversionRate {
    /// Unit price as a human-readable decimal (e.g. `0.10`).
    #[must_use]
    pub fn unit_price_decimal(&self) -> Decimal {
        Decimal::try_from_i128_with_scale(i128::from(self.unit_price), self.unit_price_decimals)
            .unwrap_or_default()
    }

    /// Identity scales: every factor is 1 except `unit_price`.
    #[must_use]
    pub fn unscaled(unit_price: u64) -> Self {
        Self {
            value_decimals: 0,
            price_decimals: 0,
            allocation_decimals: 0,
            unit_price,
            unit_price_decimals: 0,
        }
    }
}

impl Default for ConversionRate {
    fn default() -> Self {
        Self {
            value_decimals: constants::NATIVE_DECIMALS,
            price_decimals: constants::ORACLE_PRICE_DECIMALS,
            allocation_decimals: constants::ALLOCATION_DECIMALS,
            unit_price: constants::UNIT_PRICE_CENTS,
            unit_price_decimals: constants::UNIT_PRICE_DECIMALS,
        }
    }
}

/// Inclusive bounds on the lock duration accepted at Initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockBounds {
    pub min_secs: i64,
    pub max_secs: i64,
}

impl LockBounds {
    #[must_use]
    pub fn contains(&self, duration_secs: i64) -> bool {
        (self.min_secs..=self.max_secs).contains(&duration_secs)
    }
}

impl Default for LockBounds {
    fn default() -> Self {
        Self {
            min_secs: constants::MIN_LOCK_DURATION_SECS,
            max_secs: constants::MAX_LOCK_DURATION_SECS,
        }
    }
}

/// Deployment-wide engine configuration.
///
/// The allow-list is fixed for the lifetime of the engine: an escrow can
/// only be initialized against one of these feeds and never redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Feeds an escrow may be bound to.
    pub oracle_allow_list: BTreeSet<OracleId>,
    /// Fixed-point conversion scales.
    #[serde(default)]
    pub conversion: ConversionRate,
    /// Accepted lock durations.
    #[serde(default)]
    pub lock_bounds: LockBounds,
    /// Wait after sale end before an emergency sweep is possible.
    #[serde(default = "default_grace")]
    pub emergency_grace_period_secs: i64,
}

fn default_grace() -> i64 {
    constants::DEFAULT_EMERGENCY_GRACE_SECS
}

impl EngineConfig {
    /// Config with default scales and bounds, allowing a single feed.
    #[must_use]
    pub fn with_oracle(oracle: OracleId) -> Self {
        Self {
            oracle_allow_list: BTreeSet::from([oracle]),
            conversion: ConversionRate::default(),
            lock_bounds: LockBounds::default(),
            emergency_grace_period_secs: constants::DEFAULT_EMERGENCY_GRACE_SECS,
        }
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Whether `oracle` is on the allow-list.
    #[must_use]
    pub fn allows_oracle(&self, oracle: &OracleId) -> bool {
        self.oracle_allow_list.contains(oracle)
    }

    /// Reject configurations no escrow could operate under.
    pub fn validate(&self) -> Result<()> {
        if self.oracle_allow_list.is_empty() {
            return Err(EscrowError::Configuration(
                "oracle allow-list must not be empty".into(),
            ));
        }
        if self.conversion.unit_price == 0 {
            return Err(EscrowError::Configuration(
                "unit price must be positive".into(),
            ));
        }
        if self.lock_bounds.min_secs <= 0 || self.lock_bounds.min_secs > self.lock_bounds.max_secs
        {
            return Err(EscrowError::Configuration(format!(
                "invalid lock bounds {}..={}",
                self.lock_bounds.min_secs, self.lock_bounds.max_secs
            )));
        }
        if self.emergency_grace_period_secs < 0 {
            return Err(EscrowError::Configuration(
                "emergency grace period must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_matches_deployment() {
        let rate = ConversionRate::default();
        assert_eq!(rate.value_decimals, 9);
        assert_eq!(rate.price_decimals, 8);
        assert_eq!(rate.unit_price_decimal(), Decimal::new(10, 2));
    }

    #[test]
    fn lock_bounds_inclusive() {
        let bounds = LockBounds::default();
        assert!(bounds.contains(60));
        assert!(bounds.contains(365 * 24 * 60 * 60));
        assert!(!bounds.contains(59));
        assert!(!bounds.contains(365 * 24 * 60 * 60 + 1));
    }

    #[test]
    fn empty_allow_list_rejected() {
        let mut cfg = EngineConfig::with_oracle(OracleId::from_label("feed"));
        assert!(cfg.validate().is_ok());
        cfg.oracle_allow_list.clear();
        assert!(matches!(
            cfg.validate(),
            Err(EscrowError::Configuration(_))
        ));
    }

    #[test]
    fn zero_unit_price_rejected() {
        let mut cfg = EngineConfig::with_oracle(OracleId::from_label("feed"));
        cfg.conversion.unit_price = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_fills_defaults() {
        let feed = OracleId::from_bytes([7; 32]);
        let json = format!(
            r#"{{ "oracle_allow_list": [{}] }}"#,
            serde_json::to_string(&feed).unwrap()
        );
        let cfg = EngineConfig::from_json(&json).unwrap();
        assert!(cfg.allows_oracle(&feed));
        assert_eq!(cfg.conversion, ConversionRate::default());
        assert_eq!(cfg.lock_bounds, LockBounds::default());
        assert_eq!(
            cfg.emergency_grace_period_secs,
            constants::DEFAULT_EMERGENCY_GRACE_SECS
        );
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, EscrowError::Serialization(_)));
    }
}
