//! Mutex-guarded engine handle for hosts that invoke operations
//! concurrently.
//!
//! A single writer lock over the whole engine covers both the global
//! aggregate and whichever investor record an operation touches, and is
//! held for the full operation. Clones share one engine.

use std::sync::{Arc, Mutex, MutexGuard};

use ondrix_core::{Clock, ConservationReport, PriceFeed};
use ondrix_types::{
    AccountId, EscrowError, EscrowId, EscrowStatus, EventRecord, InitializeParams,
    InvestorAccount, LockStatus, Result,
};

use crate::custody::Custody;
use crate::engine::{DepositReceipt, EmergencySweep, SettlementEngine};

pub struct SharedEngine<C, F, K> {
    inner: Arc<Mutex<SettlementEngine<C, F, K>>>,
}

impl<C, F, K> Clone for SharedEngine<C, F, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Custody, F: PriceFeed, K: Clock> SharedEngine<C, F, K> {
    #[must_use]
    pub fn new(engine: SettlementEngine<C, F, K>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SettlementEngine<C, F, K>>> {
        self.inner
            .lock()
            .map_err(|_| EscrowError::Internal("engine lock poisoned".into()))
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<T>(&self, f: impl FnOnce(&mut SettlementEngine<C, F, K>) -> Result<T>) -> Result<T> {
        let mut engine = self.lock()?;
        f(&mut engine)
    }

    pub fn initialize(&self, caller: AccountId, params: InitializeParams) -> Result<EscrowId> {
        self.lock()?.initialize(caller, params)
    }

    pub fn deposit(&self, depositor: AccountId, value: u64) -> Result<DepositReceipt> {
        self.lock()?.deposit(depositor, value)
    }

    pub fn release_locked(&self, caller: AccountId, investor: AccountId) -> Result<u64> {
        self.lock()?.release_locked(caller, investor)
    }

    pub fn claim_pending(&self, caller: AccountId) -> Result<u64> {
        self.lock()?.claim_pending(caller)
    }

    pub fn close_sale(&self, caller: AccountId) -> Result<u64> {
        self.lock()?.close_sale(caller)
    }

    pub fn pause(&self, caller: AccountId) -> Result<()> {
        self.lock()?.pause(caller)
    }

    pub fn unpause(&self, caller: AccountId) -> Result<()> {
        self.lock()?.unpause(caller)
    }

    pub fn activate_emergency_stop(&self, caller: AccountId) -> Result<()> {
        self.lock()?.activate_emergency_stop(caller)
    }

    pub fn deactivate_emergency_stop(&self, caller: AccountId) -> Result<()> {
        self.lock()?.deactivate_emergency_stop(caller)
    }

    pub fn emergency_withdraw(&self, caller: AccountId) -> Result<EmergencySweep> {
        self.lock()?.emergency_withdraw(caller)
    }

    pub fn status(&self) -> Result<EscrowStatus> {
        self.lock()?.status()
    }

    pub fn investor(&self, id: &AccountId) -> Result<InvestorAccount> {
        self.lock()?.investor(id)
    }

    pub fn pending(&self, id: &AccountId) -> Result<u64> {
        Ok(self.lock()?.pending(id))
    }

    pub fn lock_status(&self, id: &AccountId) -> Result<LockStatus> {
        self.lock()?.lock_status(id)
    }

    pub fn total_deposited(&self) -> Result<u64> {
        self.lock()?.total_deposited()
    }

    pub fn total_locked(&self) -> Result<u64> {
        self.lock()?.total_locked()
    }

    pub fn total_released(&self) -> Result<u64> {
        self.lock()?.total_released()
    }

    pub fn total_claimed(&self) -> Result<u64> {
        self.lock()?.total_claimed()
    }

    /// Copy of every committed record.
    pub fn events(&self) -> Result<Vec<EventRecord>> {
        Ok(self.lock()?.events().to_vec())
    }

    pub fn verify_event_chain(&self) -> Result<()> {
        self.lock()?.verify_event_chain()
    }

    pub fn conservation_report(&self) -> Result<ConservationReport> {
        self.lock()?.conservation_report()
    }

    pub fn verify_conservation(&self) -> Result<()> {
        self.lock()?.verify_conservation()
    }
}
