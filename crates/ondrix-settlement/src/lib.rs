//! # ondrix-settlement
//!
//! **Settlement Engine**: the operations of one value-custody escrow.
//!
//! ## Architecture
//!
//! A caller invokes one [`SettlementEngine`] operation. The engine:
//! 1. Validates lifecycle, guards, caller and windows against the ledger
//! 2. Reads a fresh oracle price and converts value to allocation
//! 3. Mutates the ledger and withdrawal queue under an undo journal
//! 4. Executes one [`Custody`] transfer batch; a failure rolls everything back
//! 5. Appends hash-chained [`EventRecord`](ondrix_types::EventRecord)s
//!
//! ## Operations
//!
//! - **Initialize**: fund the escrow, anchor the global unlock moment
//! - **Deposit**: value in, allocation out, half queued, half locked
//! - **ReleaseLocked**: recipient queues matured locked value
//! - **ClaimPending**: the only path that pays native value out
//! - **CloseSale**: unsold allocation back to the recipient
//! - **Pause / EmergencyStop / EmergencyWithdraw**: administrator controls

pub mod custody;
pub mod engine;
pub mod event_log;
pub mod shared;

pub use custody::{Custody, InMemoryCustody, Transfer};
pub use engine::{DepositReceipt, EmergencySweep, SettlementEngine};
pub use event_log::{CollectingSink, EventLog, EventSink, verify_records};
pub use shared::SharedEngine;
