//! Error types for the Ondrix escrow.
//!
//! All errors use the `ESC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by failure class:
//! - 1xx: Validation errors (bad parameters, window violations)
//! - 2xx: Authorization errors (wrong caller)
//! - 3xx: Lifecycle state errors
//! - 4xx: Oracle errors
//! - 5xx: Economic errors
//! - 6xx: Custody errors
//! - 9xx: General / internal errors
//!
//! Every error aborts the operation that raised it with zero state mutation.

use std::fmt;

use thiserror::Error;

use crate::{AccountId, AssetId, OracleId};

/// Failure class of an [`EscrowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authorization,
    State,
    Oracle,
    Economic,
    Custody,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::State => write!(f, "STATE"),
            Self::Oracle => write!(f, "ORACLE"),
            Self::Economic => write!(f, "ECONOMIC"),
            Self::Custody => write!(f, "CUSTODY"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Central error enum for all escrow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// An amount parameter is zero, inverted or otherwise unusable.
    #[error("ESC_ERR_100: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The settlement asset does not match the custody adapter's asset.
    #[error("ESC_ERR_101: Invalid settlement asset: expected {expected}, got {actual}")]
    InvalidAsset { expected: AssetId, actual: AssetId },

    /// The oracle is not on the allow-list or does not match the escrow's feed.
    #[error("ESC_ERR_102: Invalid oracle: {0}")]
    InvalidOracle(OracleId),

    /// A lock duration or sale window is out of bounds.
    #[error("ESC_ERR_103: Invalid window: {reason}")]
    InvalidWindow { reason: String },

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// The caller is not allowed to perform this operation.
    #[error("ESC_ERR_200: Unauthorized caller: {caller}")]
    Unauthorized { caller: AccountId },

    // =================================================================
    // State Errors (3xx)
    // =================================================================
    /// Initialize was called on an escrow that already exists.
    #[error("ESC_ERR_300: Escrow already initialized")]
    AlreadyInitialized,

    /// The escrow has not been initialized yet.
    #[error("ESC_ERR_301: Escrow not initialized")]
    NotInitialized,

    /// The global unlock moment has not been reached.
    #[error("ESC_ERR_302: Value still locked until {unlock_at} (now {now})")]
    StillLocked { unlock_at: i64, now: i64 },

    /// The investor has no locked value left to release.
    #[error("ESC_ERR_303: Nothing to release")]
    NothingToRelease,

    /// No unsold allocation remains to reclaim.
    #[error("ESC_ERR_304: Nothing to reclaim")]
    NothingToReclaim,

    /// The caller has no pending withdrawal credit.
    #[error("ESC_ERR_305: Nothing to claim for {0}")]
    NothingToClaim(AccountId),

    /// No investor account exists for this identity.
    #[error("ESC_ERR_306: Investor not found: {0}")]
    InvestorNotFound(AccountId),

    /// The investor's locked value was already released; the account is closed.
    #[error("ESC_ERR_307: Investor account already released: {0}")]
    AccountReleased(AccountId),

    /// The sale end moment has not been reached.
    #[error("ESC_ERR_308: Sale has not ended (ends at {sale_end_at})")]
    SaleNotEnded { sale_end_at: i64 },

    /// Deposits are paused.
    #[error("ESC_ERR_309: Deposits are paused")]
    Paused,

    /// Pause requested while already paused.
    #[error("ESC_ERR_310: Escrow already paused")]
    AlreadyPaused,

    /// Unpause requested while not paused.
    #[error("ESC_ERR_311: Escrow not paused")]
    NotPaused,

    /// The emergency stop is active and blocks this operation.
    #[error("ESC_ERR_312: Emergency stop active")]
    EmergencyStopActive,

    /// The operation requires an active emergency stop.
    #[error("ESC_ERR_313: Emergency stop not active")]
    EmergencyStopInactive,

    /// The post-sale grace period has not elapsed.
    #[error("ESC_ERR_314: Grace period active until {available_at}")]
    GracePeriodActive { available_at: i64 },

    /// Custody holds nothing to sweep.
    #[error("ESC_ERR_315: Nothing to withdraw")]
    NothingToWithdraw,

    // =================================================================
    // Oracle Errors (4xx)
    // =================================================================
    /// The oracle answer is non-positive or unrepresentable.
    #[error("ESC_ERR_400: Invalid price: {reason}")]
    InvalidPrice { reason: String },

    /// The oracle observation is older than the staleness threshold.
    #[error("ESC_ERR_401: Stale price: age {age_secs}s exceeds {threshold_secs}s")]
    StalePrice { age_secs: u64, threshold_secs: u64 },

    // =================================================================
    // Economic Errors (5xx)
    // =================================================================
    /// Not enough unsold allocation to cover the deposit.
    #[error("ESC_ERR_500: Insufficient supply: requested {requested}, remaining {remaining}")]
    InsufficientSupply { requested: u64, remaining: u64 },

    /// The deposit is smaller than the configured minimum.
    #[error("ESC_ERR_501: Investment {value} below minimum {minimum}")]
    InvestmentBelowMinimum { value: u64, minimum: u64 },

    /// The investor's cumulative deposit would exceed the maximum.
    #[error("ESC_ERR_502: Cumulative investment {cumulative} exceeds maximum {maximum}")]
    InvestmentExceedsMaximum { cumulative: u64, maximum: u64 },

    /// The deposit converts to zero allocation at the configured scale.
    #[error("ESC_ERR_503: Deposit too small to represent at allocation precision")]
    PrecisionTooSmall,

    /// Fixed-point arithmetic overflowed.
    #[error("ESC_ERR_504: Arithmetic overflow")]
    Overflow,

    // =================================================================
    // Custody Errors (6xx)
    // =================================================================
    /// Custody holds less than the amount owed.
    #[error("ESC_ERR_600: Insufficient custody balance: need {needed}, have {available}")]
    InsufficientCustodyBalance { needed: u64, available: u64 },

    /// An external transfer was rejected.
    #[error("ESC_ERR_601: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// Value conservation invariant violated: critical safety alert.
    #[error("ESC_ERR_602: Conservation invariant violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("ESC_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("ESC_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("ESC_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl EscrowError {
    /// The failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. }
            | Self::InvalidAsset { .. }
            | Self::InvalidOracle(_)
            | Self::InvalidWindow { .. } => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::AlreadyInitialized
            | Self::NotInitialized
            | Self::StillLocked { .. }
            | Self::NothingToRelease
            | Self::NothingToReclaim
            | Self::NothingToClaim(_)
            | Self::InvestorNotFound(_)
            | Self::AccountReleased(_)
            | Self::SaleNotEnded { .. }
            | Self::Paused
            | Self::AlreadyPaused
            | Self::NotPaused
            | Self::EmergencyStopActive
            | Self::EmergencyStopInactive
            | Self::GracePeriodActive { .. }
            | Self::NothingToWithdraw => ErrorKind::State,
            Self::InvalidPrice { .. } | Self::StalePrice { .. } => ErrorKind::Oracle,
            Self::InsufficientSupply { .. }
            | Self::InvestmentBelowMinimum { .. }
            | Self::InvestmentExceedsMaximum { .. }
            | Self::PrecisionTooSmall
            | Self::Overflow => ErrorKind::Economic,
            Self::InsufficientCustodyBalance { .. }
            | Self::TransferFailed { .. }
            | Self::ConservationViolation { .. } => ErrorKind::Custody,
            Self::Internal(_) | Self::Serialization(_) | Self::Configuration(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The `ESC_ERR_nnn` code of this error.
    #[must_use]
    pub fn code(&self) -> String {
        let msg = self.to_string();
        msg.split(':').next().unwrap_or_default().to_string()
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

impl From<serde_json::Error> for EscrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
