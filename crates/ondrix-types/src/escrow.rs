//! The global escrow aggregate.
//!
//! One [`GlobalEscrow`] exists per escrow instance. It is created exactly
//! once by Initialize, never deleted, and mutated only by settlement engine
//! operations.
//!
//! ## Invariants
//!
//! ```text
//! allocation_sold + allocation_reclaimed ≤ total_allocation_available
//! total_value_withdrawn                  ≤ total_value_deposited
//! total_value_claimed                    ≤ total_value_deposited
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    AccountId, AssetId, EscrowError, EscrowId, OperationGuard, OracleId, Result, constants,
};

/// Per-instance parameters supplied to Initialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeParams {
    pub settlement_asset: AssetId,
    /// Identity entitled to released native value and unsold allocation.
    pub recipient: AccountId,
    /// Allocation units moved into custody.
    pub total_allocation: u64,
    pub lock_duration_secs: i64,
    pub sale_end_at: i64,
    pub oracle: OracleId,
    pub min_deposit: u64,
    pub max_deposit_per_investor: u64,
    pub price_staleness_threshold_secs: u64,
}

impl InitializeParams {
    /// Parameters with the deployment's default deposit bounds and
    /// staleness threshold.
    #[must_use]
    pub fn with_defaults(
        settlement_asset: AssetId,
        recipient: AccountId,
        oracle: OracleId,
        total_allocation: u64,
        lock_duration_secs: i64,
        sale_end_at: i64,
    ) -> Self {
        Self {
            settlement_asset,
            recipient,
            total_allocation,
            lock_duration_secs,
            sale_end_at,
            oracle,
            min_deposit: constants::DEFAULT_MIN_DEPOSIT,
            max_deposit_per_investor: constants::DEFAULT_MAX_DEPOSIT_PER_INVESTOR,
            price_staleness_threshold_secs: constants::DEFAULT_PRICE_STALENESS_SECS,
        }
    }
}

/// Global counters and configuration of one escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalEscrow {
    pub id: EscrowId,
    pub initialized: bool,
    pub administrator: AccountId,
    pub settlement_asset: AssetId,
    pub recipient: AccountId,
    pub total_allocation_available: u64,
    pub allocation_sold: u64,
    /// Unsold allocation returned to the recipient (CloseSale) or swept.
    pub allocation_reclaimed: u64,
    pub total_value_deposited: u64,
    /// Native value released from locks.
    pub total_value_withdrawn: u64,
    /// Native value paid out of custody through ClaimPending.
    pub total_value_claimed: u64,
    pub lock_duration_secs: i64,
    pub sale_end_at: i64,
    /// Anchor of the global unlock moment for every investor.
    pub initialized_at: i64,
    pub oracle: OracleId,
    pub min_deposit: u64,
    pub max_deposit_per_investor: u64,
    pub price_staleness_threshold_secs: u64,
    pub guard: OperationGuard,
    pub sale_closed: bool,
    pub emergency_withdrawn: bool,
}

impl GlobalEscrow {
    /// Build the aggregate from validated Initialize parameters.
    #[must_use]
    pub fn new(administrator: AccountId, params: &InitializeParams, now: i64) -> Self {
        Self {
            id: EscrowId::derive(&administrator, &params.settlement_asset),
            initialized: true,
            administrator,
            settlement_asset: params.settlement_asset,
            recipient: params.recipient,
            total_allocation_available: params.total_allocation,
            allocation_sold: 0,
            allocation_reclaimed: 0,
            total_value_deposited: 0,
            total_value_withdrawn: 0,
            total_value_claimed: 0,
            lock_duration_secs: params.lock_duration_secs,
            sale_end_at: params.sale_end_at,
            initialized_at: now,
            oracle: params.oracle,
            min_deposit: params.min_deposit,
            max_deposit_per_investor: params.max_deposit_per_investor,
            price_staleness_threshold_secs: params.price_staleness_threshold_secs,
            guard: OperationGuard::new(),
            sale_closed: false,
            emergency_withdrawn: false,
        }
    }

    /// The single global unlock moment: `initialized_at + lock_duration`.
    #[must_use]
    pub fn unlock_at(&self) -> i64 {
        self.initialized_at.saturating_add(self.lock_duration_secs)
    }

    #[must_use]
    pub fn is_unlocked(&self, now: i64) -> bool {
        now >= self.unlock_at()
    }

    /// Allocation still available for deposits.
    #[must_use]
    pub fn remaining_allocation(&self) -> u64 {
        self.total_allocation_available
            .saturating_sub(self.allocation_sold)
            .saturating_sub(self.allocation_reclaimed)
    }

    #[must_use]
    pub fn is_administrator(&self, caller: &AccountId) -> bool {
        &self.administrator == caller
    }

    #[must_use]
    pub fn is_recipient(&self, caller: &AccountId) -> bool {
        &self.recipient == caller
    }

    pub fn require_administrator(&self, caller: &AccountId) -> Result<()> {
        if self.is_administrator(caller) {
            Ok(())
        } else {
            Err(EscrowError::Unauthorized { caller: *caller })
        }
    }

    pub fn require_recipient(&self, caller: &AccountId) -> Result<()> {
        if self.is_recipient(caller) {
            Ok(())
        } else {
            Err(EscrowError::Unauthorized { caller: *caller })
        }
    }

    /// Check the aggregate's counter invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let accounted = self
            .allocation_sold
            .checked_add(self.allocation_reclaimed)
            .ok_or(EscrowError::Overflow)?;
        if accounted > self.total_allocation_available {
            return Err(EscrowError::ConservationViolation {
                reason: format!(
                    "allocation sold {} + reclaimed {} exceeds total {}",
                    self.allocation_sold,
                    self.allocation_reclaimed,
                    self.total_allocation_available
                ),
            });
        }
        if self.total_value_withdrawn > self.total_value_deposited {
            return Err(EscrowError::ConservationViolation {
                reason: format!(
                    "released {} exceeds deposited {}",
                    self.total_value_withdrawn, self.total_value_deposited
                ),
            });
        }
        if self.total_value_claimed > self.total_value_deposited {
            return Err(EscrowError::ConservationViolation {
                reason: format!(
                    "claimed {} exceeds deposited {}",
                    self.total_value_claimed, self.total_value_deposited
                ),
            });
        }
        Ok(())
    }

    /// Read-only snapshot at `now`.
    #[must_use]
    pub fn status(&self, now: i64) -> EscrowStatus {
        EscrowStatus {
            id: self.id,
            administrator: self.administrator,
            settlement_asset: self.settlement_asset,
            recipient: self.recipient,
            oracle: self.oracle,
            total_allocation_available: self.total_allocation_available,
            allocation_sold: self.allocation_sold,
            allocation_reclaimed: self.allocation_reclaimed,
            remaining_allocation: self.remaining_allocation(),
            total_value_deposited: self.total_value_deposited,
            total_value_withdrawn: self.total_value_withdrawn,
            total_value_claimed: self.total_value_claimed,
            lock_duration_secs: self.lock_duration_secs,
            initialized_at: self.initialized_at,
            unlock_at: self.unlock_at(),
            is_unlocked: self.is_unlocked(now),
            sale_end_at: self.sale_end_at,
            sale_ended: now >= self.sale_end_at,
            sale_closed: self.sale_closed,
            min_deposit: self.min_deposit,
            max_deposit_per_investor: self.max_deposit_per_investor,
            price_staleness_threshold_secs: self.price_staleness_threshold_secs,
            paused: self.guard.is_paused(),
            emergency_stop: self.guard.is_emergency_stopped(),
            emergency_withdrawn: self.emergency_withdrawn,
        }
    }
}

/// `GetStatus()` view: global counters and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowStatus {
    pub id: EscrowId,
    pub administrator: AccountId,
    pub settlement_asset: AssetId,
    pub recipient: AccountId,
    pub oracle: OracleId,
    pub total_allocation_available: u64,
    pub allocation_sold: u64,
    pub allocation_reclaimed: u64,
    pub remaining_allocation: u64,
    pub total_value_deposited: u64,
    pub total_value_withdrawn: u64,
    pub total_value_claimed: u64,
    pub lock_duration_secs: i64,
    pub initialized_at: i64,
    pub unlock_at: i64,
    pub is_unlocked: bool,
    pub sale_end_at: i64,
    pub sale_ended: bool,
    pub sale_closed: bool,
    pub min_deposit: u64,
    pub max_deposit_per_investor: u64,
    pub price_staleness_threshold_secs: u64,
    pub paused: bool,
    pub emergency_stop: bool,
    pub emergency_withdrawn: bool,
}
