//! Withdrawal Queue: pull-payment credits owed to payees.
//!
//! Deposit and ReleaseLocked never push native value to the recipient;
//! they record a credit here. Only ClaimPending moves real value, so a
//! payee that rejects receipts cannot block deposits or releases.

use std::collections::HashMap;

use ondrix_types::{AccountId, EscrowError, Result};

/// Pending native value per payee.
#[derive(Debug, Clone, Default)]
pub struct WithdrawalQueue {
    pending: HashMap<AccountId, u64>,
}

impl WithdrawalQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `payee`'s credit. Returns the new balance.
    ///
    /// # Errors
    /// Returns `Overflow` if the credit would exceed `u64::MAX`.
    pub fn credit(&mut self, payee: AccountId, amount: u64) -> Result<u64> {
        let slot = self.pending.entry(payee).or_insert(0);
        *slot = slot.checked_add(amount).ok_or(EscrowError::Overflow)?;
        Ok(*slot)
    }

    /// Zero `payee`'s credit and return what it was.
    pub fn take(&mut self, payee: &AccountId) -> u64 {
        self.pending.remove(payee).unwrap_or(0)
    }

    /// Overwrite `payee`'s credit. Zero removes the entry.
    pub fn set(&mut self, payee: AccountId, amount: u64) {
        if amount == 0 {
            self.pending.remove(&payee);
        } else {
            self.pending.insert(payee, amount);
        }
    }

    #[must_use]
    pub fn pending(&self, payee: &AccountId) -> u64 {
        self.pending.get(payee).copied().unwrap_or(0)
    }

    /// Sum of all pending credits.
    pub fn total(&self) -> Result<u64> {
        self.pending
            .values()
            .try_fold(0u64, |acc, v| acc.checked_add(*v))
            .ok_or(EscrowError::Overflow)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
