//! # ondrix-types
//!
//! Shared types, errors, and configuration for the **Ondrix** escrow.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AssetId`], [`OracleId`], [`EscrowId`], [`EventId`]
//! - **Escrow model**: [`GlobalEscrow`], [`InitializeParams`], [`EscrowStatus`]
//! - **Investor model**: [`InvestorAccount`], [`InvestorStatus`], [`LockStatus`]
//! - **Oracle model**: [`RawPrice`], [`PriceObservation`]
//! - **Guards**: [`OperationGuard`], [`Operation`]
//! - **Events**: [`EscrowEvent`], [`EventRecord`], [`QueueReason`]
//! - **Configuration**: [`EngineConfig`], [`ConversionRate`], [`LockBounds`]
//! - **Errors**: [`EscrowError`] with `ESC_ERR_` prefix codes
//! - **Constants**: deployment defaults and bounds

pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod event;
pub mod guard;
pub mod ids;
pub mod investor;
pub mod price;

pub use config::*;
pub use error::*;
pub use escrow::*;
pub use event::*;
pub use guard::*;
pub use ids::*;
pub use investor::*;
pub use price::*;

// Constants are accessed via `ondrix_types::constants::FOO`
// (not re-exported to avoid name collisions).
