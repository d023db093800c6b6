//! Deployment defaults and hard bounds for the Ondrix escrow.

/// Decimals of the native value unit (1 native = 10^9 base units).
pub const NATIVE_DECIMALS: u32 = 9;

/// Decimals carried by the oracle's quote price.
pub const ORACLE_PRICE_DECIMALS: u32 = 8;

/// Decimals of the settlement asset.
pub const ALLOCATION_DECIMALS: u32 = 9;

/// Fixed allocation unit price, in quote cents (0.10 quote units).
pub const UNIT_PRICE_CENTS: u64 = 10;

/// Decimals of [`UNIT_PRICE_CENTS`] relative to one quote unit.
pub const UNIT_PRICE_DECIMALS: u32 = 2;

/// Default maximum age of a price observation, in seconds.
pub const DEFAULT_PRICE_STALENESS_SECS: u64 = 300;

/// Default minimum single deposit (0.001 native).
pub const DEFAULT_MIN_DEPOSIT: u64 = 1_000_000;

/// Default cumulative maximum per investor (10,000 native).
pub const DEFAULT_MAX_DEPOSIT_PER_INVESTOR: u64 = 10_000_000_000_000;

/// Shortest accepted lock duration, in seconds.
pub const MIN_LOCK_DURATION_SECS: i64 = 60;

/// Longest accepted lock duration (one year), in seconds.
pub const MAX_LOCK_DURATION_SECS: i64 = 365 * 24 * 60 * 60;

/// Default wait after sale end before an emergency sweep is allowed (7 days).
pub const DEFAULT_EMERGENCY_GRACE_SECS: i64 = 7 * 24 * 60 * 60;

/// Domain separator for escrow id derivation.
pub const ESCROW_ID_DOMAIN: &[u8] = b"ondrix:global_escrow:v1:";

/// Domain separator for the event hash chain.
pub const EVENT_HASH_DOMAIN: &[u8] = b"ondrix:event:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Ondrix";
