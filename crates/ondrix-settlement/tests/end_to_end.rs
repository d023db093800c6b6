//! End-to-end escrow lifecycle tests.
//!
//! These drive a [`SettlementEngine`] through in-memory custody, a manual
//! price feed and a manual clock: initialize, deposit, release, claim,
//! close and the administrator's emergency controls.

use ondrix_core::{ManualClock, ManualPriceFeed};
use ondrix_settlement::{
    CollectingSink, Custody, InMemoryCustody, SettlementEngine, verify_records,
};
use ondrix_types::*;

const T0: i64 = 1_700_000_000;
const LOCK: i64 = 300;
const SALE_END: i64 = T0 + 3_600;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

type Engine = SettlementEngine<InMemoryCustody, ManualPriceFeed, ManualClock>;

/// Helper: one escrow with its ports and the usual cast of identities.
struct Escrow {
    engine: Engine,
    custody: InMemoryCustody,
    feed: ManualPriceFeed,
    clock: ManualClock,
    oracle: OracleId,
    asset: AssetId,
    admin: AccountId,
    recipient: AccountId,
}

impl Escrow {
    /// Unscaled conversion at a unit price of 10: `allocation = value · price / 10`.
    fn new() -> Self {
        init_tracing();
        let oracle = OracleId::from_label("sol-usd");
        let asset = AssetId::from_label("ondrix-token");
        let mut config = EngineConfig::with_oracle(oracle);
        config.conversion = ConversionRate::unscaled(10);

        let custody = InMemoryCustody::new(asset);
        let feed = ManualPriceFeed::with_price(oracle, 100, T0);
        let clock = ManualClock::at(T0);
        let admin = AccountId::from_label("admin");
        let recipient = AccountId::from_label("recipient");
        custody.fund_allocation(admin, 1_000_000).unwrap();

        let engine = Engine::new(config, custody.clone(), feed.clone(), clock.clone()).unwrap();
        Self {
            engine,
            custody,
            feed,
            clock,
            oracle,
            asset,
            admin,
            recipient,
        }
    }

    fn params(&self) -> InitializeParams {
        InitializeParams {
            settlement_asset: self.asset,
            recipient: self.recipient,
            total_allocation: 1_000,
            lock_duration_secs: LOCK,
            sale_end_at: SALE_END,
            oracle: self.oracle,
            min_deposit: 1,
            max_deposit_per_investor: 1_000,
            price_staleness_threshold_secs: 300,
        }
    }

    fn initialized() -> Self {
        let mut escrow = Self::new();
        let params = escrow.params();
        escrow.engine.initialize(escrow.admin, params).unwrap();
        escrow
    }

    fn investor(&self, label: &str) -> AccountId {
        let id = AccountId::from_label(label);
        self.custody.fund_native(id, 1_000_000).unwrap();
        id
    }

    /// Move the clock and keep the feed fresh at `price`.
    fn advance(&self, secs: i64, price: i128) {
        self.clock.advance(secs);
        self.feed.set(price, self.clock_now());
    }

    fn clock_now(&self) -> i64 {
        self.engine.now()
    }
}

// =============================================================================
// Initialize
// =============================================================================

#[test]
fn initialize_validates_parameters() {
    let mut escrow = Escrow::new();
    let admin = escrow.admin;

    let mut p = escrow.params();
    p.settlement_asset = AssetId::from_label("other");
    assert!(matches!(
        escrow.engine.initialize(admin, p),
        Err(EscrowError::InvalidAsset { .. })
    ));

    let mut p = escrow.params();
    p.total_allocation = 0;
    assert!(matches!(
        escrow.engine.initialize(admin, p),
        Err(EscrowError::InvalidAmount { .. })
    ));

    let mut p = escrow.params();
    p.min_deposit = 2_000;
    assert!(matches!(
        escrow.engine.initialize(admin, p),
        Err(EscrowError::InvalidAmount { .. })
    ));

    let mut p = escrow.params();
    p.oracle = OracleId::from_label("eth-usd");
    assert!(matches!(
        escrow.engine.initialize(admin, p),
        Err(EscrowError::InvalidOracle(_))
    ));

    let mut p = escrow.params();
    p.lock_duration_secs = 59;
    assert!(matches!(
        escrow.engine.initialize(admin, p),
        Err(EscrowError::InvalidWindow { .. })
    ));

    let mut p = escrow.params();
    p.sale_end_at = T0;
    assert!(matches!(
        escrow.engine.initialize(admin, p),
        Err(EscrowError::InvalidWindow { .. })
    ));

    // Nothing above left a trace.
    assert!(matches!(
        escrow.engine.status(),
        Err(EscrowError::NotInitialized)
    ));
    assert!(escrow.engine.events().is_empty());
    assert_eq!(escrow.custody.allocation_balance().unwrap(), 0);

    let p = escrow.params();
    escrow.engine.initialize(admin, p.clone()).unwrap();
    assert!(matches!(
        escrow.engine.initialize(admin, p),
        Err(EscrowError::AlreadyInitialized)
    ));
}

#[test]
fn default_bounds_reject_sub_minimum_deposits() {
    let mut escrow = Escrow::new();
    let params = InitializeParams::with_defaults(
        escrow.asset,
        escrow.recipient,
        escrow.oracle,
        1_000,
        LOCK,
        SALE_END,
    );
    escrow.engine.initialize(escrow.admin, params).unwrap();
    let alice = escrow.investor("alice");

    assert!(matches!(
        escrow.engine.deposit(alice, constants::DEFAULT_MIN_DEPOSIT - 1),
        Err(EscrowError::InvestmentBelowMinimum {
            minimum: constants::DEFAULT_MIN_DEPOSIT,
            ..
        })
    ));
    assert!(escrow.engine.investor(&alice).is_err());
}

#[test]
fn oracle_must_be_allow_listed_even_if_feed_matches() {
    init_tracing();
    let feed_id = OracleId::from_label("unlisted");
    let asset = AssetId::from_label("ondrix-token");
    let custody = InMemoryCustody::new(asset);
    let admin = AccountId::from_label("admin");
    custody.fund_allocation(admin, 1_000).unwrap();
    let mut engine = Engine::new(
        EngineConfig::with_oracle(OracleId::from_label("listed")),
        custody,
        ManualPriceFeed::with_price(feed_id, 100, T0),
        ManualClock::at(T0),
    )
    .unwrap();

    let params = InitializeParams {
        settlement_asset: asset,
        recipient: AccountId::from_label("recipient"),
        total_allocation: 1_000,
        lock_duration_secs: LOCK,
        sale_end_at: SALE_END,
        oracle: feed_id,
        min_deposit: 1,
        max_deposit_per_investor: 1_000,
        price_staleness_threshold_secs: 300,
    };
    assert!(matches!(
        engine.initialize(admin, params),
        Err(EscrowError::InvalidOracle(_))
    ));
}

#[test]
fn unfunded_administrator_cannot_initialize() {
    let mut escrow = Escrow::new();
    let broke = AccountId::from_label("broke-admin");
    let params = escrow.params();
    assert!(matches!(
        escrow.engine.initialize(broke, params),
        Err(EscrowError::TransferFailed { .. })
    ));
    assert!(matches!(
        escrow.engine.status(),
        Err(EscrowError::NotInitialized)
    ));
}

// =============================================================================
// deposit splits and allocates
// =============================================================================

#[test]
fn deposit_splits_value() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");

    let receipt = escrow.engine.deposit(alice, 10).unwrap();
    let rate = escrow.engine.config().conversion;
    let expected = ondrix_core::convert(10, 100, &rate).unwrap();
    assert_eq!(receipt.allocation, expected);
    assert_eq!(receipt.allocation, 100);

    let account = escrow.engine.investor(&alice).unwrap();
    assert_eq!(account.locked_value, 5);
    assert_eq!(account.cumulative_allocation_received, 100);
    assert_eq!(account.first_observed_price, 100);
    assert_eq!(account.first_deposit_at, T0);
    assert_eq!(account.status, InvestorStatus::Deposited);
    assert_eq!(escrow.engine.pending(&escrow.recipient), 5);
    assert_eq!(escrow.custody.allocation_wallet(&alice).unwrap(), 100);

    let status = escrow.engine.status().unwrap();
    assert_eq!(status.allocation_sold, 100);
    assert_eq!(status.total_value_deposited, 10);
    escrow.engine.verify_conservation().unwrap();
}

#[test]
fn deposit_emits_deposited_then_queued() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 11).unwrap();

    let names: Vec<_> = escrow
        .engine
        .events()
        .iter()
        .map(|r| r.event.name())
        .collect();
    assert_eq!(names, ["INITIALIZED", "DEPOSITED", "WITHDRAWAL_QUEUED"]);
    match &escrow.engine.events()[2].event {
        EscrowEvent::WithdrawalQueued {
            payee,
            amount,
            reason,
        } => {
            assert_eq!(*payee, escrow.recipient);
            assert_eq!(*amount, 5);
            assert_eq!(*reason, QueueReason::DepositSplit);
        }
        other => panic!("unexpected event {other}"),
    }
    assert_eq!(escrow.engine.investor(&alice).unwrap().locked_value, 6);
    escrow.engine.verify_event_chain().unwrap();
}

// =============================================================================
// below minimum
// =============================================================================

#[test]
fn below_minimum_mutates_nothing() {
    let mut escrow = Escrow::new();
    let mut params = escrow.params();
    // Minimum of 1.0 at one decimal of native precision; deposit 0.5.
    params.min_deposit = 10;
    escrow.engine.initialize(escrow.admin, params).unwrap();
    let alice = escrow.investor("alice");

    let before = escrow.engine.status().unwrap();
    assert!(matches!(
        escrow.engine.deposit(alice, 5),
        Err(EscrowError::InvestmentBelowMinimum {
            value: 5,
            minimum: 10
        })
    ));
    assert_eq!(escrow.engine.status().unwrap(), before);
    assert!(escrow.engine.investor(&alice).is_err());
    assert_eq!(escrow.engine.pending(&escrow.recipient), 0);
    assert_eq!(escrow.engine.events().len(), 1);
}

#[test]
fn cumulative_maximum_enforced() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 60).unwrap();
    assert!(matches!(
        escrow.engine.deposit(alice, 941),
        Err(EscrowError::InvestmentExceedsMaximum {
            cumulative: 1_001,
            maximum: 1_000
        })
    ));
}

#[test]
fn supply_exhaustion_rejected() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    let bob = escrow.investor("bob");
    // 99 · 100 / 10 = 990 of 1000.
    escrow.engine.deposit(alice, 99).unwrap();
    assert!(matches!(
        escrow.engine.deposit(bob, 2),
        Err(EscrowError::InsufficientSupply {
            requested: 20,
            remaining: 10
        })
    ));
    escrow.engine.deposit(bob, 1).unwrap();
    assert_eq!(escrow.engine.status().unwrap().remaining_allocation, 0);
}

#[test]
fn dust_deposit_is_precision_too_small() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.feed.set(1, T0);
    // 1 · 1 / 10 rounds to zero.
    assert!(matches!(
        escrow.engine.deposit(alice, 1),
        Err(EscrowError::PrecisionTooSmall)
    ));
}

// =============================================================================
// only the recipient releases
// =============================================================================

#[test]
fn release_by_non_recipient_unauthorized() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 10).unwrap();
    escrow.advance(LOCK, 100);

    for caller in [alice, escrow.admin, AccountId::from_label("mallory")] {
        assert!(matches!(
            escrow.engine.release_locked(caller, alice),
            Err(EscrowError::Unauthorized { .. })
        ));
    }
    assert_eq!(escrow.engine.investor(&alice).unwrap().locked_value, 5);
}

// =============================================================================
// stale oracle
// =============================================================================

#[test]
fn stale_price_rejected() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.clock.advance(301);

    assert!(matches!(
        escrow.engine.deposit(alice, 10),
        Err(EscrowError::StalePrice {
            age_secs: 301,
            threshold_secs: 300
        })
    ));
    assert_eq!(escrow.engine.status().unwrap().allocation_sold, 0);

    escrow.feed.set(100, escrow.clock_now());
    escrow.engine.deposit(alice, 10).unwrap();
}

#[test]
fn invalid_price_rejected() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.feed.set(0, T0);
    assert!(matches!(
        escrow.engine.deposit(alice, 10),
        Err(EscrowError::InvalidPrice { .. })
    ));
    escrow.feed.set(-5, T0);
    assert!(matches!(
        escrow.engine.deposit(alice, 10),
        Err(EscrowError::InvalidPrice { .. })
    ));
}

// =============================================================================
// weighted average price
// =============================================================================

#[test]
fn weighted_average_across_deposits() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 20).unwrap();
    escrow.advance(10, 200);
    let receipt = escrow.engine.deposit(alice, 20).unwrap();

    assert_eq!(receipt.weighted_average_price, 150);
    let account = escrow.engine.investor(&alice).unwrap();
    assert_eq!(account.weighted_average_price, 150);
    assert_eq!(account.first_observed_price, 100);
    assert_eq!(account.deposit_count, 2);
    assert_eq!(account.cumulative_value_deposited, 40);
    assert_eq!(account.first_deposit_at, T0);
    assert_eq!(account.last_deposit_at, T0 + 10);
}

// =============================================================================
// close sale twice
// =============================================================================

#[test]
fn close_sale_once() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 10).unwrap();

    assert!(matches!(
        escrow.engine.close_sale(escrow.recipient),
        Err(EscrowError::SaleNotEnded { .. })
    ));
    escrow.clock.set(SALE_END);
    assert!(matches!(
        escrow.engine.close_sale(escrow.admin),
        Err(EscrowError::Unauthorized { .. })
    ));

    assert_eq!(escrow.engine.close_sale(escrow.recipient).unwrap(), 900);
    assert_eq!(
        escrow.custody.allocation_wallet(&escrow.recipient).unwrap(),
        900
    );
    assert!(matches!(
        escrow.engine.close_sale(escrow.recipient),
        Err(EscrowError::NothingToReclaim)
    ));

    let status = escrow.engine.status().unwrap();
    assert!(status.sale_closed);
    assert_eq!(status.allocation_reclaimed, 900);
    assert_eq!(status.remaining_allocation, 0);

    // Nothing left to sell.
    escrow.feed.set(100, SALE_END);
    assert!(matches!(
        escrow.engine.deposit(alice, 1),
        Err(EscrowError::InsufficientSupply { .. })
    ));
    escrow.engine.verify_conservation().unwrap();
}

// =============================================================================
// Release and claim lifecycle
// =============================================================================

#[test]
fn global_unlock_ignores_deposit_time() {
    let mut escrow = Escrow::initialized();
    let early = escrow.investor("early");
    let late = escrow.investor("late");
    escrow.engine.deposit(early, 10).unwrap();
    escrow.advance(LOCK - 1, 100);
    escrow.engine.deposit(late, 10).unwrap();

    for investor in [early, late] {
        assert!(matches!(
            escrow.engine.release_locked(escrow.recipient, investor),
            Err(EscrowError::StillLocked { .. })
        ));
    }

    escrow.advance(1, 100);
    let lock = escrow.engine.lock_status(&late).unwrap();
    assert!(lock.is_unlocked);
    assert_eq!(lock.unlock_at, T0 + LOCK);
    assert_eq!(lock.time_remaining_secs, 0);
    assert_eq!(escrow.engine.release_locked(escrow.recipient, early).unwrap(), 5);
    assert_eq!(escrow.engine.release_locked(escrow.recipient, late).unwrap(), 5);
}

#[test]
fn release_exactly_once() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 9).unwrap();
    escrow.advance(LOCK, 100);

    assert_eq!(escrow.engine.release_locked(escrow.recipient, alice).unwrap(), 5);
    assert!(matches!(
        escrow.engine.release_locked(escrow.recipient, alice),
        Err(EscrowError::NothingToRelease)
    ));
    assert_eq!(escrow.engine.total_released().unwrap(), 5);
    assert_eq!(escrow.engine.total_locked().unwrap(), 0);

    // The account is finished; no new lock can be created behind it.
    assert!(matches!(
        escrow.engine.deposit(alice, 1),
        Err(EscrowError::AccountReleased(_))
    ));
}

#[test]
fn release_of_unknown_investor() {
    let mut escrow = Escrow::initialized();
    escrow.advance(LOCK, 100);
    let ghost = AccountId::from_label("ghost");
    assert!(matches!(
        escrow.engine.release_locked(escrow.recipient, ghost),
        Err(EscrowError::InvestorNotFound(_))
    ));
}

#[test]
fn full_lifecycle_pays_recipient_everything() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    let bob = escrow.investor("bob");
    escrow.engine.deposit(alice, 10).unwrap();
    escrow.engine.deposit(bob, 7).unwrap();

    // Immediate halves: 5 + 3.
    assert_eq!(escrow.engine.claim_pending(escrow.recipient).unwrap(), 8);

    escrow.advance(LOCK, 100);
    escrow.engine.release_locked(escrow.recipient, alice).unwrap();
    escrow.engine.release_locked(escrow.recipient, bob).unwrap();
    assert_eq!(escrow.engine.claim_pending(escrow.recipient).unwrap(), 9);

    assert_eq!(
        escrow.custody.native_wallet(&escrow.recipient).unwrap(),
        17
    );
    assert_eq!(escrow.custody.native_balance().unwrap(), 0);
    assert_eq!(escrow.engine.total_claimed().unwrap(), 17);
    assert_eq!(escrow.engine.total_deposited().unwrap(), 17);
    escrow.engine.verify_conservation().unwrap();
    escrow.engine.verify_event_chain().unwrap();
}

// =============================================================================
// Guards and emergency controls
// =============================================================================

#[test]
fn emergency_stop_keeps_claims_open() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 10).unwrap();
    escrow.engine.activate_emergency_stop(escrow.admin).unwrap();
    escrow.advance(SALE_END - T0, 100);

    assert!(matches!(
        escrow.engine.deposit(alice, 10),
        Err(EscrowError::EmergencyStopActive)
    ));
    assert!(matches!(
        escrow.engine.release_locked(escrow.recipient, alice),
        Err(EscrowError::EmergencyStopActive)
    ));
    assert!(matches!(
        escrow.engine.close_sale(escrow.recipient),
        Err(EscrowError::EmergencyStopActive)
    ));
    assert_eq!(escrow.engine.claim_pending(escrow.recipient).unwrap(), 5);

    escrow.engine.deactivate_emergency_stop(escrow.admin).unwrap();
    assert_eq!(escrow.engine.release_locked(escrow.recipient, alice).unwrap(), 5);
}

#[test]
fn pause_blocks_deposits_only() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 10).unwrap();
    escrow.engine.pause(escrow.admin).unwrap();
    assert!(escrow.engine.status().unwrap().paused);
    assert!(matches!(
        escrow.engine.deposit(alice, 10),
        Err(EscrowError::Paused)
    ));
    escrow.advance(LOCK, 100);
    escrow.engine.release_locked(escrow.recipient, alice).unwrap();
    escrow.engine.claim_pending(escrow.recipient).unwrap();
    assert!(matches!(
        escrow.engine.unpause(escrow.recipient),
        Err(EscrowError::Unauthorized { .. })
    ));
}

#[test]
fn guard_toggles_reject_redundant_requests() {
    let mut escrow = Escrow::initialized();
    let admin = escrow.admin;
    let events_before = escrow.engine.events().len();

    assert!(matches!(
        escrow.engine.unpause(admin),
        Err(EscrowError::NotPaused)
    ));
    assert!(matches!(
        escrow.engine.deactivate_emergency_stop(admin),
        Err(EscrowError::EmergencyStopInactive)
    ));
    assert_eq!(escrow.engine.events().len(), events_before);

    escrow.engine.pause(admin).unwrap();
    assert!(matches!(
        escrow.engine.pause(admin),
        Err(EscrowError::AlreadyPaused)
    ));
    escrow.engine.activate_emergency_stop(admin).unwrap();
    assert!(matches!(
        escrow.engine.activate_emergency_stop(admin),
        Err(EscrowError::EmergencyStopActive)
    ));
    escrow.engine.deactivate_emergency_stop(admin).unwrap();
    escrow.engine.unpause(admin).unwrap();

    let names: Vec<_> = escrow.engine.events()[events_before..]
        .iter()
        .map(|r| r.event.name())
        .collect();
    assert_eq!(
        names,
        [
            "PAUSED",
            "EMERGENCY_STOP_ACTIVATED",
            "EMERGENCY_STOP_DEACTIVATED",
            "UNPAUSED"
        ]
    );
    let status = escrow.engine.status().unwrap();
    assert!(!status.paused && !status.emergency_stop);
}

#[test]
fn emergency_withdraw_requires_stop_and_grace() {
    let mut escrow = Escrow::initialized();
    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 10).unwrap();
    let grace = escrow.engine.config().emergency_grace_period_secs;

    escrow.clock.set(SALE_END + grace - 1);
    escrow.engine.activate_emergency_stop(escrow.admin).unwrap();
    assert!(matches!(
        escrow.engine.emergency_withdraw(escrow.admin),
        Err(EscrowError::GracePeriodActive { .. })
    ));

    escrow.clock.set(SALE_END + grace);
    escrow.engine.deactivate_emergency_stop(escrow.admin).unwrap();
    assert!(matches!(
        escrow.engine.emergency_withdraw(escrow.admin),
        Err(EscrowError::EmergencyStopInactive)
    ));

    escrow.engine.activate_emergency_stop(escrow.admin).unwrap();
    assert!(matches!(
        escrow.engine.emergency_withdraw(escrow.recipient),
        Err(EscrowError::Unauthorized { .. })
    ));
    let sweep = escrow.engine.emergency_withdraw(escrow.admin).unwrap();
    assert_eq!(sweep.allocation, 900);
    assert_eq!(sweep.native, 10);
    assert_eq!(escrow.custody.native_wallet(&escrow.admin).unwrap(), 10);

    let status = escrow.engine.status().unwrap();
    assert!(status.emergency_withdrawn);
    assert_eq!(status.remaining_allocation, 0);

    assert!(matches!(
        escrow.engine.emergency_withdraw(escrow.admin),
        Err(EscrowError::NothingToWithdraw)
    ));
    // Credits survive the sweep but custody can no longer honour them.
    assert!(matches!(
        escrow.engine.claim_pending(escrow.recipient),
        Err(EscrowError::InsufficientCustodyBalance { .. })
    ));
    escrow.engine.verify_conservation().unwrap();
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn sinks_receive_only_committed_records() {
    let mut escrow = Escrow::initialized();
    let sink = std::sync::Arc::new(std::sync::Mutex::new(CollectingSink::default()));

    struct Forward(std::sync::Arc<std::sync::Mutex<CollectingSink>>);
    impl ondrix_settlement::EventSink for Forward {
        fn on_event(&mut self, record: &EventRecord) {
            use ondrix_settlement::EventSink as _;
            self.0.lock().unwrap().on_event(record);
        }
    }
    escrow.engine.subscribe(Box::new(Forward(sink.clone())));

    let alice = escrow.investor("alice");
    escrow.engine.deposit(alice, 10).unwrap();
    assert!(escrow.engine.deposit(alice, 5_000).is_err());
    escrow.engine.pause(escrow.admin).unwrap();

    let seen = sink.lock().unwrap().records.clone();
    let names: Vec<_> = seen.iter().map(|r| r.event.name()).collect();
    assert_eq!(names, ["DEPOSITED", "WITHDRAWAL_QUEUED", "PAUSED"]);
    assert_eq!(seen[0].sequence, 1);
    assert!(verify_records(escrow.engine.events()).is_ok());
    assert_eq!(
        seen.last().map(|r| r.hash),
        escrow.engine.events().last().map(|r| r.hash)
    );
}
