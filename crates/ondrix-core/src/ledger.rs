//! Ledger: durable escrow state with all-or-nothing commits.
//!
//! Holds the [`GlobalEscrow`] aggregate, the investor store and the
//! withdrawal queue. Mutations made between [`Ledger::begin`] and
//! [`Ledger::commit`] are journaled as pre-images; [`Ledger::rollback`]
//! replays the journal in reverse so an aborted operation leaves no trace.
//!
//! Read accessors never journal. Mutable accessors journal on every call,
//! which is harmless: reverse replay restores the oldest pre-image last.

use std::collections::HashMap;

use ondrix_types::{AccountId, EscrowError, GlobalEscrow, InvestorAccount, Result};

use crate::withdrawal_queue::WithdrawalQueue;

/// Pre-image of one mutated record.
#[derive(Debug, Clone)]
enum UndoEntry {
    Escrow(Option<GlobalEscrow>),
    Investor(AccountId, Option<InvestorAccount>),
    Pending(AccountId, u64),
}

/// Escrow state store. Owned exclusively by the settlement engine.
#[derive(Debug, Default)]
pub struct Ledger {
    escrow: Option<GlobalEscrow>,
    investors: HashMap<AccountId, InvestorAccount>,
    queue: WithdrawalQueue,
    journal: Option<Vec<UndoEntry>>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------

    /// Open a unit of work.
    ///
    /// # Errors
    /// Returns `Internal` if a unit of work is already open.
    pub fn begin(&mut self) -> Result<()> {
        if self.journal.is_some() {
            return Err(EscrowError::Internal("ledger transaction already open".into()));
        }
        self.journal = Some(Vec::new());
        Ok(())
    }

    /// Keep every mutation since [`Ledger::begin`].
    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every mutation since [`Ledger::begin`].
    pub fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for entry in journal.into_iter().rev() {
            match entry {
                UndoEntry::Escrow(pre) => self.escrow = pre,
                UndoEntry::Investor(id, Some(pre)) => {
                    self.investors.insert(id, pre);
                }
                UndoEntry::Investor(id, None) => {
                    self.investors.remove(&id);
                }
                UndoEntry::Pending(payee, pre) => self.queue.set(payee, pre),
            }
        }
    }

    fn record(&mut self, entry: UndoEntry) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(entry);
        }
    }

    // -----------------------------------------------------------------
    // Global escrow
    // -----------------------------------------------------------------

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.escrow.as_ref().is_some_and(|e| e.initialized)
    }

    /// Create the aggregate. Happens exactly once.
    ///
    /// # Errors
    /// Returns `AlreadyInitialized` if an escrow already exists.
    pub fn create_escrow(&mut self, escrow: GlobalEscrow) -> Result<()> {
        if self.is_initialized() {
            return Err(EscrowError::AlreadyInitialized);
        }
        let pre = self.escrow.take();
        self.record(UndoEntry::Escrow(pre));
        self.escrow = Some(escrow);
        Ok(())
    }

    pub fn escrow(&self) -> Result<&GlobalEscrow> {
        self.escrow
            .as_ref()
            .filter(|e| e.initialized)
            .ok_or(EscrowError::NotInitialized)
    }

    pub fn escrow_mut(&mut self) -> Result<&mut GlobalEscrow> {
        let pre = self.escrow()?.clone();
        self.record(UndoEntry::Escrow(Some(pre)));
        self.escrow.as_mut().ok_or(EscrowError::NotInitialized)
    }

    // -----------------------------------------------------------------
    // Investors
    // -----------------------------------------------------------------

    #[must_use]
    pub fn investor(&self, id: &AccountId) -> Option<&InvestorAccount> {
        self.investors.get(id)
    }

    /// Mutable record for `id`, creating a blank one on first access.
    pub fn investor_entry(&mut self, id: AccountId) -> Result<&mut InvestorAccount> {
        let escrow_id = self.escrow()?.id;
        let pre = self.investors.get(&id).cloned();
        self.record(UndoEntry::Investor(id, pre));
        Ok(self
            .investors
            .entry(id)
            .or_insert_with(|| InvestorAccount::new(id, escrow_id)))
    }

    /// Mutable record for an existing, initialized investor.
    ///
    /// # Errors
    /// Returns `InvestorNotFound` if no deposit was ever recorded for `id`.
    pub fn investor_mut(&mut self, id: &AccountId) -> Result<&mut InvestorAccount> {
        let pre = self
            .investors
            .get(id)
            .filter(|acct| acct.initialized)
            .cloned()
            .ok_or(EscrowError::InvestorNotFound(*id))?;
        self.record(UndoEntry::Investor(*id, Some(pre)));
        self.investors
            .get_mut(id)
            .ok_or(EscrowError::InvestorNotFound(*id))
    }

    pub fn investors(&self) -> impl Iterator<Item = &InvestorAccount> {
        self.investors.values()
    }

    #[must_use]
    pub fn investor_count(&self) -> usize {
        self.investors.values().filter(|a| a.initialized).count()
    }

    /// Σ locked value across investors.
    pub fn total_locked(&self) -> Result<u64> {
        self.investors
            .values()
            .try_fold(0u64, |acc, a| acc.checked_add(a.locked_value))
            .ok_or(EscrowError::Overflow)
    }

    // -----------------------------------------------------------------
    // Withdrawal queue
    // -----------------------------------------------------------------

    #[must_use]
    pub fn pending(&self, payee: &AccountId) -> u64 {
        self.queue.pending(payee)
    }

    pub fn credit_pending(&mut self, payee: AccountId, amount: u64) -> Result<u64> {
        let pre = self.queue.pending(&payee);
        self.record(UndoEntry::Pending(payee, pre));
        self.queue.credit(payee, amount)
    }

    /// Zero `payee`'s credit, returning it.
    pub fn take_pending(&mut self, payee: &AccountId) -> u64 {
        let pre = self.queue.pending(payee);
        self.record(UndoEntry::Pending(*payee, pre));
        self.queue.take(payee)
    }

    /// Σ pending credits.
    pub fn total_pending(&self) -> Result<u64> {
        self.queue.total()
    }

    #[must_use]
    pub fn queue(&self) -> &WithdrawalQueue {
        &self.queue
    }
}
