//! Custody port: the only boundary where value leaves or enters escrow.
//!
//! The engine hands the port a batch of [`Transfer`]s as the last phase of
//! an operation, after every check passed and the ledger was mutated.
//! [`Custody::execute`] must apply the whole batch or none of it; a failed
//! batch makes the engine roll the ledger back.
//!
//! [`InMemoryCustody`] models the vaults and the external wallets around
//! them. Payees can be marked as rejecting receipts to simulate a
//! malfunctioning recipient.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use ondrix_types::{AccountId, AssetId, EscrowError, Result};

/// One movement of value across the custody boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Native value from a wallet into the native vault.
    CollectNative { from: AccountId, amount: u64 },
    /// Native value from the native vault to a wallet.
    PayNative { to: AccountId, amount: u64 },
    /// Settlement asset from a wallet into the allocation vault.
    CollectAllocation { from: AccountId, amount: u64 },
    /// Settlement asset from the allocation vault to a wallet.
    PayAllocation { to: AccountId, amount: u64 },
}

impl Transfer {
    #[must_use]
    pub fn amount(&self) -> u64 {
        match self {
            Self::CollectNative { amount, .. }
            | Self::PayNative { amount, .. }
            | Self::CollectAllocation { amount, .. }
            | Self::PayAllocation { amount, .. } => *amount,
        }
    }
}

/// Asset and native-value custody of one escrow.
pub trait Custody {
    /// The settlement asset held in the allocation vault.
    fn settlement_asset(&self) -> AssetId;

    /// Native value currently held in custody.
    fn native_balance(&self) -> Result<u64>;

    /// Settlement asset currently held in custody.
    fn allocation_balance(&self) -> Result<u64>;

    /// Apply every transfer in order, or none of them.
    ///
    /// # Errors
    /// `TransferFailed` or `InsufficientCustodyBalance`; custody is unchanged.
    fn execute(&mut self, transfers: &[Transfer]) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
struct Vaults {
    native: u64,
    allocation: u64,
    native_wallets: HashMap<AccountId, u64>,
    allocation_wallets: HashMap<AccountId, u64>,
    rejecting: HashSet<AccountId>,
}

impl Vaults {
    fn debit(wallets: &mut HashMap<AccountId, u64>, owner: AccountId, amount: u64) -> Result<()> {
        let balance = wallets.get(&owner).copied().unwrap_or(0);
        let rest = balance
            .checked_sub(amount)
            .ok_or_else(|| EscrowError::TransferFailed {
                reason: format!("{owner} holds {balance}, needs {amount}"),
            })?;
        wallets.insert(owner, rest);
        Ok(())
    }

    fn credit(
        wallets: &mut HashMap<AccountId, u64>,
        rejecting: &HashSet<AccountId>,
        owner: AccountId,
        amount: u64,
    ) -> Result<()> {
        if rejecting.contains(&owner) {
            return Err(EscrowError::TransferFailed {
                reason: format!("{owner} rejected receipt"),
            });
        }
        let slot = wallets.entry(owner).or_insert(0);
        *slot = slot.checked_add(amount).ok_or(EscrowError::Overflow)?;
        Ok(())
    }

    fn withdraw(vault: &mut u64, amount: u64) -> Result<()> {
        *vault = vault
            .checked_sub(amount)
            .ok_or(EscrowError::InsufficientCustodyBalance {
                needed: amount,
                available: *vault,
            })?;
        Ok(())
    }

    fn apply(&mut self, transfer: Transfer) -> Result<()> {
        match transfer {
            Transfer::CollectNative { from, amount } => {
                Self::debit(&mut self.native_wallets, from, amount)?;
                self.native = self.native.checked_add(amount).ok_or(EscrowError::Overflow)?;
            }
            Transfer::PayNative { to, amount } => {
                Self::withdraw(&mut self.native, amount)?;
                Self::credit(&mut self.native_wallets, &self.rejecting, to, amount)?;
            }
            Transfer::CollectAllocation { from, amount } => {
                Self::debit(&mut self.allocation_wallets, from, amount)?;
                self.allocation = self
                    .allocation
                    .checked_add(amount)
                    .ok_or(EscrowError::Overflow)?;
            }
            Transfer::PayAllocation { to, amount } => {
                Self::withdraw(&mut self.allocation, amount)?;
                Self::credit(&mut self.allocation_wallets, &self.rejecting, to, amount)?;
            }
        }
        Ok(())
    }
}

/// In-memory vaults plus the wallets that trade with them.
///
/// Clones share the same state, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone)]
pub struct InMemoryCustody {
    asset: AssetId,
    state: Arc<Mutex<Vaults>>,
}

impl InMemoryCustody {
    #[must_use]
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            state: Arc::new(Mutex::new(Vaults::default())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vaults>> {
        self.state
            .lock()
            .map_err(|_| EscrowError::Internal("custody lock poisoned".into()))
    }

    /// Give `owner` native value to deposit with.
    pub fn fund_native(&self, owner: AccountId, amount: u64) -> Result<()> {
        let mut vaults = self.lock()?;
        let slot = vaults.native_wallets.entry(owner).or_insert(0);
        *slot = slot.checked_add(amount).ok_or(EscrowError::Overflow)?;
        Ok(())
    }

    /// Give `owner` settlement asset to fund an escrow with.
    pub fn fund_allocation(&self, owner: AccountId, amount: u64) -> Result<()> {
        let mut vaults = self.lock()?;
        let slot = vaults.allocation_wallets.entry(owner).or_insert(0);
        *slot = slot.checked_add(amount).ok_or(EscrowError::Overflow)?;
        Ok(())
    }

    /// Make every transfer to `owner` fail until [`Self::accept_receipts`].
    pub fn reject_receipts(&self, owner: AccountId) -> Result<()> {
        self.lock()?.rejecting.insert(owner);
        Ok(())
    }

    pub fn accept_receipts(&self, owner: &AccountId) -> Result<()> {
        self.lock()?.rejecting.remove(owner);
        Ok(())
    }

    /// Native value in `owner`'s wallet.
    pub fn native_wallet(&self, owner: &AccountId) -> Result<u64> {
        Ok(self.lock()?.native_wallets.get(owner).copied().unwrap_or(0))
    }

    /// Settlement asset in `owner`'s wallet.
    pub fn allocation_wallet(&self, owner: &AccountId) -> Result<u64> {
        Ok(self
            .lock()?
            .allocation_wallets
            .get(owner)
            .copied()
            .unwrap_or(0))
    }

    /// Remove native value from the vault behind the ledger's back.
    /// Simulates accounting drift.
    pub fn leak_native(&self, amount: u64) -> Result<()> {
        let mut vaults = self.lock()?;
        vaults.native = vaults.native.saturating_sub(amount);
        Ok(())
    }
}

impl Custody for InMemoryCustody {
    fn settlement_asset(&self) -> AssetId {
        self.asset
    }

    fn native_balance(&self) -> Result<u64> {
        Ok(self.lock()?.native)
    }

    fn allocation_balance(&self) -> Result<u64> {
        Ok(self.lock()?.allocation)
    }

    fn execute(&mut self, transfers: &[Transfer]) -> Result<()> {
        let mut vaults = self.lock()?;
        let mut staged = vaults.clone();
        for transfer in transfers {
            staged.apply(*transfer)?;
        }
        *vaults = staged;
        Ok(())
    }
}
