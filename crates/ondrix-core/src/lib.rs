//! # ondrix-core
//!
//! **Leaf components of the Ondrix escrow.** Everything here is
//! deterministic given its inputs; the settlement engine composes these
//! pieces into atomic operations.
//!
//! - **Conversion Engine**: value + price → allocation, overflow- and precision-safe
//! - **Oracle Adapter**: validates and freshness-checks [`PriceFeed`] answers
//! - **Clock**: the point-in-time source every window comparison uses
//! - **Withdrawal Queue**: pull-payment credits owed to payees
//! - **Ledger**: global escrow + investor store with an undo journal
//! - **Conservation**: system-wide value conservation checks

pub mod clock;
pub mod conservation;
pub mod conversion;
pub mod ledger;
pub mod oracle;
pub mod withdrawal_queue;

pub use clock::{Clock, ManualClock, SystemClock};
pub use conservation::ConservationReport;
pub use conversion::{DepositSplit, convert, split_deposit, weighted_average_price};
pub use ledger::Ledger;
pub use oracle::{ManualPriceFeed, OracleAdapter, PriceFeed};
pub use withdrawal_queue::WithdrawalQueue;
