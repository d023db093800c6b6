//! Settlement Engine: orchestrates every escrow operation.
//!
//! Each mutating operation runs as one unit of work in three phases:
//!
//! 1. **Validate**: lifecycle, guards, caller, windows, oracle, conversion
//! 2. **Mutate**: ledger and withdrawal queue, journaled for rollback
//! 3. **Transfer**: a single custody batch, executed last
//!
//! Before phase 3 the aggregate invariants and value conservation are
//! re-checked and the event records are prepared. If anything fails, the
//! ledger is rolled back and no record is appended: partial application is
//! never observable.

use ondrix_core::{
    Clock, ConservationReport, Ledger, OracleAdapter, PriceFeed, convert, split_deposit,
    weighted_average_price,
};
use ondrix_types::{
    AccountId, EngineConfig, EscrowError, EscrowEvent, EscrowId, EscrowStatus, EventRecord,
    GlobalEscrow, InitializeParams, InvestorAccount, InvestorStatus, LockStatus, Operation,
    OperationGuard, PriceObservation, QueueReason, Result, constants,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::custody::{Custody, Transfer};
use crate::event_log::{EventLog, EventSink};

/// Outcome of a committed deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub depositor: AccountId,
    pub value: u64,
    pub allocation: u64,
    pub price: u64,
    pub observed_at: i64,
    /// Queued for the recipient.
    pub immediate: u64,
    /// Held until the global unlock.
    pub locked: u64,
    pub weighted_average_price: u64,
}

/// What an emergency sweep moved to the administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencySweep {
    pub allocation: u64,
    pub native: u64,
}

/// Result of phases 1 and 2, handed to phase 3.
struct Staged<T> {
    output: T,
    events: Vec<EscrowEvent>,
    transfers: Vec<Transfer>,
}

impl<T> Staged<T> {
    fn new(output: T) -> Self {
        Self {
            output,
            events: Vec::new(),
            transfers: Vec::new(),
        }
    }

    fn event(mut self, event: EscrowEvent) -> Self {
        self.events.push(event);
        self
    }

    fn transfer(mut self, transfer: Transfer) -> Self {
        if transfer.amount() > 0 {
            self.transfers.push(transfer);
        }
        self
    }
}

/// One escrow instance and the ports it settles through.
pub struct SettlementEngine<C, F, K> {
    config: EngineConfig,
    ledger: Ledger,
    custody: C,
    feed: F,
    clock: K,
    events: EventLog,
}

impl<C: Custody, F: PriceFeed, K: Clock> SettlementEngine<C, F, K> {
    /// Build an engine over validated configuration.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` fails validation.
    pub fn new(config: EngineConfig, custody: C, feed: F, clock: K) -> Result<Self> {
        config.validate()?;
        info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            oracles = config.oracle_allow_list.len(),
            "Settlement engine ready"
        );
        Ok(Self {
            config,
            ledger: Ledger::new(),
            custody,
            feed,
            clock,
            events: EventLog::new(),
        })
    }

    // -----------------------------------------------------------------
    // Unit of work
    // -----------------------------------------------------------------

    fn atomically<T>(
        &mut self,
        operation: &'static str,
        body: impl FnOnce(&mut Self, i64) -> Result<Staged<T>>,
    ) -> Result<T> {
        let now = self.clock.now();
        self.ledger.begin()?;
        match self.stage_and_transfer(now, body) {
            Ok((output, records)) => {
                self.ledger.commit();
                self.events.publish(records);
                Ok(output)
            }
            Err(err) => {
                self.ledger.rollback();
                warn!(
                    operation,
                    code = %err.code(),
                    kind = %err.kind(),
                    error = %err,
                    "Operation aborted"
                );
                Err(err)
            }
        }
    }

    fn stage_and_transfer<T>(
        &mut self,
        now: i64,
        body: impl FnOnce(&mut Self, i64) -> Result<Staged<T>>,
    ) -> Result<(T, Vec<EventRecord>)> {
        let staged = body(self, now)?;

        let escrow = self.ledger.escrow()?;
        escrow.check_invariants()?;
        ConservationReport::from_ledger(&self.ledger)?.verify()?;
        let records = self.events.prepare(escrow.id, now, staged.events)?;
        self.events.check_extends(&records)?;

        self.custody.execute(&staged.transfers)?;
        Ok((staged.output, records))
    }

    // -----------------------------------------------------------------
    // Initialize
    // -----------------------------------------------------------------

    /// Create and fund the escrow. `caller` becomes its administrator.
    pub fn initialize(&mut self, caller: AccountId, params: InitializeParams) -> Result<EscrowId> {
        let id = self.atomically("initialize", move |engine, now| {
            if engine.ledger.is_initialized() {
                return Err(EscrowError::AlreadyInitialized);
            }
            engine.validate_params(&params, now)?;

            let escrow = GlobalEscrow::new(caller, &params, now);
            let id = escrow.id;
            engine.ledger.create_escrow(escrow)?;

            Ok(Staged::new(id)
                .event(EscrowEvent::Initialized {
                    administrator: caller,
                    settlement_asset: params.settlement_asset,
                    recipient: params.recipient,
                    oracle: params.oracle,
                    total_allocation: params.total_allocation,
                    lock_duration_secs: params.lock_duration_secs,
                    sale_end_at: params.sale_end_at,
                })
                .transfer(Transfer::CollectAllocation {
                    from: caller,
                    amount: params.total_allocation,
                }))
        })?;
        let escrow = self.ledger.escrow()?;
        info!(
            escrow = %id,
            administrator = %caller,
            recipient = %escrow.recipient,
            oracle = %escrow.oracle,
            total_allocation = escrow.total_allocation_available,
            unlock_at = escrow.unlock_at(),
            sale_end_at = escrow.sale_end_at,
            "Escrow initialized"
        );
        Ok(id)
    }

    fn validate_params(&self, params: &InitializeParams, now: i64) -> Result<()> {
        let expected = self.custody.settlement_asset();
        if params.settlement_asset != expected {
            return Err(EscrowError::InvalidAsset {
                expected,
                actual: params.settlement_asset,
            });
        }
        if params.total_allocation == 0 {
            return Err(EscrowError::InvalidAmount {
                reason: "total allocation must be positive".into(),
            });
        }
        if params.min_deposit == 0 {
            return Err(EscrowError::InvalidAmount {
                reason: "minimum deposit must be positive".into(),
            });
        }
        if params.min_deposit > params.max_deposit_per_investor {
            return Err(EscrowError::InvalidAmount {
                reason: format!(
                    "minimum deposit {} exceeds per-investor maximum {}",
                    params.min_deposit, params.max_deposit_per_investor
                ),
            });
        }
        if params.price_staleness_threshold_secs == 0 {
            return Err(EscrowError::InvalidAmount {
                reason: "staleness threshold must be positive".into(),
            });
        }
        if !self.config.allows_oracle(&params.oracle) || params.oracle != self.feed.feed_id() {
            return Err(EscrowError::InvalidOracle(params.oracle));
        }
        let bounds = self.config.lock_bounds;
        if !bounds.contains(params.lock_duration_secs) {
            return Err(EscrowError::InvalidWindow {
                reason: format!(
                    "lock duration {}s outside {}..={}s",
                    params.lock_duration_secs, bounds.min_secs, bounds.max_secs
                ),
            });
        }
        if params.sale_end_at <= now {
            return Err(EscrowError::InvalidWindow {
                reason: format!("sale end {} is not after now {now}", params.sale_end_at),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Deposit
    // -----------------------------------------------------------------

    /// Take `value` from `depositor`, pay out its allocation, lock half.
    pub fn deposit(&mut self, depositor: AccountId, value: u64) -> Result<DepositReceipt> {
        let receipt = self.atomically("deposit", move |engine, now| {
            engine.stage_deposit(depositor, value, now)
        })?;
        let price = PriceObservation {
            price: receipt.price,
            observed_at: receipt.observed_at,
        }
        .to_decimal(self.config.conversion.price_decimals);
        info!(
            depositor = %depositor,
            value,
            allocation = receipt.allocation,
            price = %price,
            locked = receipt.locked,
            immediate = receipt.immediate,
            "Deposit settled"
        );
        Ok(receipt)
    }

    fn stage_deposit(
        &mut self,
        depositor: AccountId,
        value: u64,
        now: i64,
    ) -> Result<Staged<DepositReceipt>> {
        let escrow = self.ledger.escrow()?.clone();
        escrow.guard.check(Operation::Deposit)?;
        if value == 0 {
            return Err(EscrowError::InvalidAmount {
                reason: "deposit must be positive".into(),
            });
        }
        if value < escrow.min_deposit {
            return Err(EscrowError::InvestmentBelowMinimum {
                value,
                minimum: escrow.min_deposit,
            });
        }

        let (first, prior_value, prior_average) = match self.ledger.investor(&depositor) {
            Some(account) if !account.is_first_deposit() => {
                if !account.status.can_transition_to(InvestorStatus::Deposited) {
                    return Err(EscrowError::AccountReleased(depositor));
                }
                (
                    false,
                    account.cumulative_value_deposited,
                    account.weighted_average_price,
                )
            }
            _ => (true, 0, 0),
        };
        let cumulative = prior_value.checked_add(value).ok_or(EscrowError::Overflow)?;
        if cumulative > escrow.max_deposit_per_investor {
            return Err(EscrowError::InvestmentExceedsMaximum {
                cumulative,
                maximum: escrow.max_deposit_per_investor,
            });
        }

        // 1. Fresh oracle read.
        let observation = OracleAdapter::new(escrow.oracle, escrow.price_staleness_threshold_secs)
            .read(&self.feed, now)?;
        let price = observation.price;

        // 2. Conversion and supply.
        let allocation = convert(value, price, &self.config.conversion)?;
        let remaining = escrow.remaining_allocation();
        if allocation > remaining {
            return Err(EscrowError::InsufficientSupply {
                requested: allocation,
                remaining,
            });
        }
        debug!(value, price, allocation, remaining, "Deposit converted");

        // 3. Price history, weighted by deposited value.
        let average = if first {
            price
        } else {
            weighted_average_price(prior_average, prior_value, price, value)?
        };

        // 4. Exact split.
        let split = split_deposit(value);

        // 5. Investor record and recipient credit.
        {
            let account = self.ledger.investor_entry(depositor)?;
            account.mark_deposited()?;
            if first {
                account.first_deposit_at = now;
                account.first_observed_price = price;
            }
            account.weighted_average_price = average;
            account.cumulative_value_deposited = cumulative;
            account.cumulative_allocation_received = account
                .cumulative_allocation_received
                .checked_add(allocation)
                .ok_or(EscrowError::Overflow)?;
            account.immediate_value = account
                .immediate_value
                .checked_add(split.immediate)
                .ok_or(EscrowError::Overflow)?;
            account.locked_value = account
                .locked_value
                .checked_add(split.locked)
                .ok_or(EscrowError::Overflow)?;
            account.last_deposit_at = now;
            account.deposit_count = account.deposit_count.saturating_add(1);
        }
        if split.immediate > 0 {
            self.ledger.credit_pending(escrow.recipient, split.immediate)?;
        }

        // 6. Global counters.
        {
            let global = self.ledger.escrow_mut()?;
            global.allocation_sold = global
                .allocation_sold
                .checked_add(allocation)
                .ok_or(EscrowError::Overflow)?;
            global.total_value_deposited = global
                .total_value_deposited
                .checked_add(value)
                .ok_or(EscrowError::Overflow)?;
        }

        // 7. Value in, allocation out.
        let mut staged = Staged::new(DepositReceipt {
            depositor,
            value,
            allocation,
            price,
            observed_at: observation.observed_at,
            immediate: split.immediate,
            locked: split.locked,
            weighted_average_price: average,
        })
        .event(EscrowEvent::Deposited {
            depositor,
            value,
            allocation,
            price,
        })
        .transfer(Transfer::CollectNative {
            from: depositor,
            amount: value,
        })
        .transfer(Transfer::PayAllocation {
            to: depositor,
            amount: allocation,
        });
        if split.immediate > 0 {
            staged = staged.event(EscrowEvent::WithdrawalQueued {
                payee: escrow.recipient,
                amount: split.immediate,
                reason: QueueReason::DepositSplit,
            });
        }
        Ok(staged)
    }

    // -----------------------------------------------------------------
    // ReleaseLocked
    // -----------------------------------------------------------------

    /// Queue `investor`'s locked value for the recipient after the global
    /// unlock. Only the recipient may call this. Returns the amount queued.
    pub fn release_locked(&mut self, caller: AccountId, investor: AccountId) -> Result<u64> {
        let amount = self.atomically("release_locked", move |engine, now| {
            let escrow = engine.ledger.escrow()?.clone();
            escrow.require_recipient(&caller)?;
            escrow.guard.check(Operation::ReleaseLocked)?;
            if !escrow.is_unlocked(now) {
                return Err(EscrowError::StillLocked {
                    unlock_at: escrow.unlock_at(),
                    now,
                });
            }

            let amount = engine.ledger.investor_mut(&investor)?.release_locked()?;
            engine.ledger.credit_pending(escrow.recipient, amount)?;
            let global = engine.ledger.escrow_mut()?;
            global.total_value_withdrawn = global
                .total_value_withdrawn
                .checked_add(amount)
                .ok_or(EscrowError::Overflow)?;

            Ok(Staged::new(amount)
                .event(EscrowEvent::LockedReleased { investor, amount })
                .event(EscrowEvent::WithdrawalQueued {
                    payee: escrow.recipient,
                    amount,
                    reason: QueueReason::LockedRelease,
                }))
        })?;
        info!(investor = %investor, amount, "Locked value released");
        Ok(amount)
    }

    // -----------------------------------------------------------------
    // ClaimPending
    // -----------------------------------------------------------------

    /// Pay out `caller`'s pending credit. Never blocked by the guards.
    pub fn claim_pending(&mut self, caller: AccountId) -> Result<u64> {
        let amount = self.atomically("claim_pending", move |engine, _now| {
            engine.ledger.escrow()?.guard.check(Operation::ClaimPending)?;
            let owed = engine.ledger.pending(&caller);
            if owed == 0 {
                return Err(EscrowError::NothingToClaim(caller));
            }
            let available = engine.custody.native_balance()?;
            if available < owed {
                return Err(EscrowError::InsufficientCustodyBalance {
                    needed: owed,
                    available,
                });
            }

            // Zero the credit before the transfer leaves custody.
            let amount = engine.ledger.take_pending(&caller);
            let global = engine.ledger.escrow_mut()?;
            global.total_value_claimed = global
                .total_value_claimed
                .checked_add(amount)
                .ok_or(EscrowError::Overflow)?;

            Ok(Staged::new(amount)
                .event(EscrowEvent::WithdrawalClaimed {
                    payee: caller,
                    amount,
                })
                .transfer(Transfer::PayNative { to: caller, amount }))
        })?;
        info!(payee = %caller, amount, "Withdrawal claimed");
        Ok(amount)
    }

    // -----------------------------------------------------------------
    // CloseSale
    // -----------------------------------------------------------------

    /// Return unsold allocation to the recipient once the sale ended.
    pub fn close_sale(&mut self, caller: AccountId) -> Result<u64> {
        let unsold = self.atomically("close_sale", move |engine, now| {
            let escrow = engine.ledger.escrow()?.clone();
            escrow.require_recipient(&caller)?;
            escrow.guard.check(Operation::CloseSale)?;
            if now < escrow.sale_end_at {
                return Err(EscrowError::SaleNotEnded {
                    sale_end_at: escrow.sale_end_at,
                });
            }
            let unsold = escrow.remaining_allocation();
            if unsold == 0 {
                return Err(EscrowError::NothingToReclaim);
            }

            let global = engine.ledger.escrow_mut()?;
            global.allocation_reclaimed = global
                .allocation_reclaimed
                .checked_add(unsold)
                .ok_or(EscrowError::Overflow)?;
            global.sale_closed = true;

            Ok(Staged::new(unsold)
                .event(EscrowEvent::SaleClosed {
                    recipient: escrow.recipient,
                    unsold,
                })
                .transfer(Transfer::PayAllocation {
                    to: escrow.recipient,
                    amount: unsold,
                }))
        })?;
        info!(unsold, "Sale closed");
        Ok(unsold)
    }

    // -----------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------

    fn toggle_guard(
        &mut self,
        operation: &'static str,
        caller: AccountId,
        apply: fn(&mut OperationGuard) -> Result<()>,
        event: EscrowEvent,
    ) -> Result<()> {
        self.atomically(operation, move |engine, _now| {
            engine.ledger.escrow()?.require_administrator(&caller)?;
            apply(&mut engine.ledger.escrow_mut()?.guard)?;
            Ok(Staged::new(()).event(event))
        })
    }

    /// Block deposits.
    pub fn pause(&mut self, caller: AccountId) -> Result<()> {
        self.toggle_guard("pause", caller, OperationGuard::pause, EscrowEvent::Paused)?;
        warn!(administrator = %caller, "Deposits paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: AccountId) -> Result<()> {
        self.toggle_guard("unpause", caller, OperationGuard::unpause, EscrowEvent::Unpaused)?;
        info!(administrator = %caller, "Deposits resumed");
        Ok(())
    }

    /// Block deposits, releases and sale close. Claims stay open.
    pub fn activate_emergency_stop(&mut self, caller: AccountId) -> Result<()> {
        self.toggle_guard(
            "activate_emergency_stop",
            caller,
            OperationGuard::activate_emergency_stop,
            EscrowEvent::EmergencyStopActivated,
        )?;
        warn!(administrator = %caller, "Emergency stop activated");
        Ok(())
    }

    pub fn deactivate_emergency_stop(&mut self, caller: AccountId) -> Result<()> {
        self.toggle_guard(
            "deactivate_emergency_stop",
            caller,
            OperationGuard::deactivate_emergency_stop,
            EscrowEvent::EmergencyStopDeactivated,
        )?;
        info!(administrator = %caller, "Emergency stop deactivated");
        Ok(())
    }

    // -----------------------------------------------------------------
    // EmergencyWithdraw
    // -----------------------------------------------------------------

    /// Sweep every remaining custody balance to the administrator.
    ///
    /// Requires an active emergency stop and `now ≥ sale_end_at + grace`.
    /// Ledger credits and locks are left in place; claims made after a
    /// sweep fail with `InsufficientCustodyBalance`.
    pub fn emergency_withdraw(&mut self, caller: AccountId) -> Result<EmergencySweep> {
        let grace = self.config.emergency_grace_period_secs;
        let sweep = self.atomically("emergency_withdraw", move |engine, now| {
            let escrow = engine.ledger.escrow()?.clone();
            escrow.require_administrator(&caller)?;
            let available_at = escrow.sale_end_at.saturating_add(grace);
            if now < available_at {
                return Err(EscrowError::GracePeriodActive { available_at });
            }
            escrow.guard.check(Operation::EmergencyWithdraw)?;

            let sweep = EmergencySweep {
                allocation: engine.custody.allocation_balance()?,
                native: engine.custody.native_balance()?,
            };
            if sweep.allocation == 0 && sweep.native == 0 {
                return Err(EscrowError::NothingToWithdraw);
            }

            let global = engine.ledger.escrow_mut()?;
            global.allocation_reclaimed = global
                .allocation_reclaimed
                .checked_add(escrow.remaining_allocation())
                .ok_or(EscrowError::Overflow)?;
            global.emergency_withdrawn = true;

            Ok(Staged::new(sweep)
                .event(EscrowEvent::EmergencyWithdrawn {
                    administrator: caller,
                    allocation: sweep.allocation,
                    native: sweep.native,
                })
                .transfer(Transfer::PayAllocation {
                    to: caller,
                    amount: sweep.allocation,
                })
                .transfer(Transfer::PayNative {
                    to: caller,
                    amount: sweep.native,
                }))
        })?;
        warn!(
            administrator = %caller,
            allocation = sweep.allocation,
            native = sweep.native,
            "Emergency withdrawal executed"
        );
        Ok(sweep)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// `GetStatus()`.
    pub fn status(&self) -> Result<EscrowStatus> {
        Ok(self.ledger.escrow()?.status(self.clock.now()))
    }

    /// `GetInvestor(id)`.
    pub fn investor(&self, id: &AccountId) -> Result<InvestorAccount> {
        self.ledger.escrow()?;
        self.ledger
            .investor(id)
            .filter(|account| account.initialized)
            .cloned()
            .ok_or(EscrowError::InvestorNotFound(*id))
    }

    /// `GetPending(id)`.
    #[must_use]
    pub fn pending(&self, id: &AccountId) -> u64 {
        self.ledger.pending(id)
    }

    /// `GetLockStatus(id)` against the global unlock moment.
    pub fn lock_status(&self, id: &AccountId) -> Result<LockStatus> {
        let unlock_at = self.ledger.escrow()?.unlock_at();
        Ok(self.investor(id)?.lock_status(unlock_at, self.clock.now()))
    }

    pub fn total_deposited(&self) -> Result<u64> {
        Ok(self.ledger.escrow()?.total_value_deposited)
    }

    pub fn total_locked(&self) -> Result<u64> {
        self.ledger.escrow()?;
        self.ledger.total_locked()
    }

    pub fn total_released(&self) -> Result<u64> {
        Ok(self.ledger.escrow()?.total_value_withdrawn)
    }

    pub fn total_claimed(&self) -> Result<u64> {
        Ok(self.ledger.escrow()?.total_value_claimed)
    }

    pub fn conservation_report(&self) -> Result<ConservationReport> {
        ConservationReport::from_ledger(&self.ledger)
    }

    /// Check ledger conservation and, unless a sweep emptied it, that
    /// custody holds exactly what the ledger says it should.
    pub fn verify_conservation(&self) -> Result<()> {
        let escrow = self.ledger.escrow()?;
        escrow.check_invariants()?;
        let report = self.conservation_report()?;
        report.verify()?;
        if escrow.emergency_withdrawn {
            return Ok(());
        }
        report.verify_custody(self.custody.native_balance()?)?;
        let held = self.custody.allocation_balance()?;
        if held != escrow.remaining_allocation() {
            return Err(EscrowError::ConservationViolation {
                reason: format!(
                    "custody holds {held} allocation, {} unsold",
                    escrow.remaining_allocation()
                ),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Events and ports
    // -----------------------------------------------------------------

    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    pub fn verify_event_chain(&self) -> Result<()> {
        self.events.verify_chain()
    }

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.events.subscribe(sink);
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn custody(&self) -> &C {
        &self.custody
    }

    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }
}
