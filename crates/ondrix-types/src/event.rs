//! Append-only escrow event records.
//!
//! Every committed mutating operation emits one or more [`EscrowEvent`]s.
//! They are the only externally durable facts beyond the state itself and
//! are consumed by dashboards and indexers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, EscrowId, EventId, OracleId};

/// Why a withdrawal credit was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueReason {
    /// Immediate half of a deposit.
    DepositSplit,
    /// Matured locked value released by the recipient.
    LockedRelease,
}

impl fmt::Display for QueueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepositSplit => write!(f, "DEPOSIT_SPLIT"),
            Self::LockedRelease => write!(f, "LOCKED_RELEASE"),
        }
    }
}

/// A fact emitted by a committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    Initialized {
        administrator: AccountId,
        settlement_asset: AssetId,
        recipient: AccountId,
        oracle: OracleId,
        total_allocation: u64,
        lock_duration_secs: i64,
        sale_end_at: i64,
    },
    Deposited {
        depositor: AccountId,
        value: u64,
        allocation: u64,
        price: u64,
    },
    LockedReleased {
        investor: AccountId,
        amount: u64,
    },
    WithdrawalQueued {
        payee: AccountId,
        amount: u64,
        reason: QueueReason,
    },
    WithdrawalClaimed {
        payee: AccountId,
        amount: u64,
    },
    SaleClosed {
        recipient: AccountId,
        unsold: u64,
    },
    Paused,
    Unpaused,
    EmergencyStopActivated,
    EmergencyStopDeactivated,
    EmergencyWithdrawn {
        administrator: AccountId,
        allocation: u64,
        native: u64,
    },
}

impl EscrowEvent {
    /// Stable upper-snake name of the event kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "INITIALIZED",
            Self::Deposited { .. } => "DEPOSITED",
            Self::LockedReleased { .. } => "LOCKED_RELEASED",
            Self::WithdrawalQueued { .. } => "WITHDRAWAL_QUEUED",
            Self::WithdrawalClaimed { .. } => "WITHDRAWAL_CLAIMED",
            Self::SaleClosed { .. } => "SALE_CLOSED",
            Self::Paused => "PAUSED",
            Self::Unpaused => "UNPAUSED",
            Self::EmergencyStopActivated => "EMERGENCY_STOP_ACTIVATED",
            Self::EmergencyStopDeactivated => "EMERGENCY_STOP_DEACTIVATED",
            Self::EmergencyWithdrawn { .. } => "EMERGENCY_WITHDRAWN",
        }
    }
}

impl fmt::Display for EscrowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the hash-chained event log.
///
/// `hash = SHA-256(domain || prev_hash || sequence || escrow || recorded_at || event_json)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    /// Zero-based position in the log.
    pub sequence: u64,
    pub escrow: EscrowId,
    /// Unix seconds from the engine clock.
    pub recorded_at: i64,
    pub event: EscrowEvent,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

impl EventRecord {
    /// `recorded_at` as a UTC timestamp, if representable.
    #[must_use]
    pub fn recorded_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.recorded_at, 0)
    }
}
