//! # InvestorAccount: per-depositor record
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────────┐  deposit   ┌───────────┐  release (recipient,  ┌───────────┐
//!   │ UNINITIALIZED ├───────────▶│ DEPOSITED ├──────────────────────▶│ WITHDRAWN │
//!   └───────────────┘            └─────┬─────┘   after global unlock) └───────────┘
//!                                      │ ▲
//!                                      └─┘ repeat deposits
//! ```
//!
//! Transitions are monotonic. `Withdrawn` is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AccountId, EscrowError, EscrowId, Result};

/// Lifecycle state of an investor account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestorStatus {
    #[default]
    Uninitialized,
    /// Value deposited, allocation received, locked portion held.
    Deposited,
    /// Locked portion released to the recipient.
    Withdrawn,
}

impl InvestorStatus {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Uninitialized | Self::Deposited, Self::Deposited)
                | (Self::Deposited, Self::Withdrawn)
        )
    }
}

impl fmt::Display for InvestorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Deposited => write!(f, "DEPOSITED"),
            Self::Withdrawn => write!(f, "WITHDRAWN"),
        }
    }
}

/// Durable per-depositor record. Created on first deposit, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorAccount {
    pub investor: AccountId,
    pub escrow: EscrowId,
    pub initialized: bool,
    pub cumulative_value_deposited: u64,
    pub cumulative_allocation_received: u64,
    /// Sum of the immediately-releasable halves of every deposit.
    pub immediate_value: u64,
    pub first_deposit_at: i64,
    pub last_deposit_at: i64,
    pub deposit_count: u32,
    pub first_observed_price: u64,
    /// Price weighted by deposited value across every deposit.
    pub weighted_average_price: u64,
    pub status: InvestorStatus,
    pub locked_value: u64,
}

impl InvestorAccount {
    /// A blank, uninitialized record for `investor`.
    #[must_use]
    pub fn new(investor: AccountId, escrow: EscrowId) -> Self {
        Self {
            investor,
            escrow,
            initialized: false,
            cumulative_value_deposited: 0,
            cumulative_allocation_received: 0,
            immediate_value: 0,
            first_deposit_at: 0,
            last_deposit_at: 0,
            deposit_count: 0,
            first_observed_price: 0,
            weighted_average_price: 0,
            status: InvestorStatus::Uninitialized,
            locked_value: 0,
        }
    }

    #[must_use]
    pub fn is_first_deposit(&self) -> bool {
        !self.initialized
    }

    /// Transition to DEPOSITED.
    ///
    /// # Errors
    /// Returns `AccountReleased` once the account reached WITHDRAWN.
    pub fn mark_deposited(&mut self) -> Result<()> {
        if !self.status.can_transition_to(InvestorStatus::Deposited) {
            return Err(EscrowError::AccountReleased(self.investor));
        }
        self.status = InvestorStatus::Deposited;
        self.initialized = true;
        Ok(())
    }

    /// Zero the locked value and transition to WITHDRAWN.
    /// Returns the amount released.
    ///
    /// # Errors
    /// Returns `NothingToRelease` if already withdrawn or nothing is locked.
    pub fn release_locked(&mut self) -> Result<u64> {
        if !self.status.can_transition_to(InvestorStatus::Withdrawn) || self.locked_value == 0 {
            return Err(EscrowError::NothingToRelease);
        }
        let amount = self.locked_value;
        self.locked_value = 0;
        self.status = InvestorStatus::Withdrawn;
        Ok(amount)
    }

    /// `GetLockStatus()` view at `now` against the global `unlock_at`.
    #[must_use]
    pub fn lock_status(&self, unlock_at: i64, now: i64) -> LockStatus {
        let is_unlocked = now >= unlock_at;
        LockStatus {
            investor: self.investor,
            status: self.status,
            total_deposited: self.cumulative_value_deposited,
            immediate: self.immediate_value,
            locked: self.locked_value,
            unlock_at,
            is_unlocked,
            time_remaining_secs: if is_unlocked {
                0
            } else {
                u64::try_from(unlock_at.saturating_sub(now)).unwrap_or(0)
            },
        }
    }
}

/// Per-investor lock view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    pub investor: AccountId,
    pub status: InvestorStatus,
    pub total_deposited: u64,
    pub immediate: u64,
    pub locked: u64,
    pub unlock_at: i64,
    pub is_unlocked: bool,
    pub time_remaining_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> InvestorAccount {
        let investor = AccountId::from_label("alice");
        InvestorAccount::new(investor, EscrowId([0; 32]))
    }

    #[test]
    fn transitions_are_monotonic() {
        use InvestorStatus::*;
        assert!(Uninitialized.can_transition_to(Deposited));
        assert!(Deposited.can_transition_to(Deposited));
        assert!(Deposited.can_transition_to(Withdrawn));
        assert!(!Uninitialized.can_transition_to(Withdrawn));
        assert!(!Withdrawn.can_transition_to(Deposited));
        assert!(!Withdrawn.can_transition_to(Withdrawn));
    }

    #[test]
    fn release_is_exactly_once() {
        let mut acct = account();
        acct.mark_deposited().unwrap();
        acct.locked_value = 5;
        assert_eq!(acct.release_locked().unwrap(), 5);
        assert_eq!(acct.locked_value, 0);
        assert_eq!(acct.status, InvestorStatus::Withdrawn);
        assert!(matches!(
            acct.release_locked(),
            Err(EscrowError::NothingToRelease)
        ));
    }

    #[test]
    fn released_account_rejects_deposits() {
        let mut acct = account();
        acct.mark_deposited().unwrap();
        acct.locked_value = 1;
        acct.release_locked().unwrap();
        assert!(matches!(
            acct.mark_deposited(),
            Err(EscrowError::AccountReleased(_))
        ));
    }

    #[test]
    fn empty_lock_cannot_release() {
        let mut acct = account();
        acct.mark_deposited().unwrap();
        assert!(matches!(
            acct.release_locked(),
            Err(EscrowError::NothingToRelease)
        ));
        assert_eq!(acct.status, InvestorStatus::Deposited);
    }

    #[test]
    fn lock_status_time_remaining() {
        let mut acct = account();
        acct.cumulative_value_deposited = 10;
        acct.immediate_value = 5;
        acct.locked_value = 5;
        let view = acct.lock_status(1_300, 1_000);
        assert!(!view.is_unlocked);
        assert_eq!(view.time_remaining_secs, 300);
        assert_eq!(view.immediate + view.locked, view.total_deposited);

        let view = acct.lock_status(1_300, 1_300);
        assert!(view.is_unlocked);
        assert_eq!(view.time_remaining_secs, 0);
    }
}
