//! Administrator-controlled operation guards.
//!
//! Two independent, reversible switches:
//! - `paused` blocks Deposit only.
//! - `emergency_stop` blocks Deposit, ReleaseLocked and CloseSale.
//!
//! ClaimPending is never blocked: already-queued obligations must stay
//! claimable during an emergency. EmergencyWithdraw *requires* the stop.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EscrowError, Result};

/// Operations subject to guard checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Deposit,
    ReleaseLocked,
    ClaimPending,
    CloseSale,
    EmergencyWithdraw,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::ReleaseLocked => write!(f, "RELEASE_LOCKED"),
            Self::ClaimPending => write!(f, "CLAIM_PENDING"),
            Self::CloseSale => write!(f, "CLOSE_SALE"),
            Self::EmergencyWithdraw => write!(f, "EMERGENCY_WITHDRAW"),
        }
    }
}

/// Pause / emergency-stop state of one escrow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationGuard {
    paused: bool,
    emergency_stop: bool,
}

impl OperationGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn is_emergency_stopped(&self) -> bool {
        self.emergency_stop
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.paused {
            return Err(EscrowError::AlreadyPaused);
        }
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<()> {
        if !self.paused {
            return Err(EscrowError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }

    pub fn activate_emergency_stop(&mut self) -> Result<()> {
        if self.emergency_stop {
            return Err(EscrowError::EmergencyStopActive);
        }
        self.emergency_stop = true;
        Ok(())
    }

    pub fn deactivate_emergency_stop(&mut self) -> Result<()> {
        if !self.emergency_stop {
            return Err(EscrowError::EmergencyStopInactive);
        }
        self.emergency_stop = false;
        Ok(())
    }

    /// Whether `op` may run under the current guard state.
    #[must_use]
    pub fn allows(&self, op: Operation) -> bool {
        self.check(op).is_ok()
    }

    /// Guard an operation. Returns `Ok(())` if allowed, or the blocking error.
    pub fn check(&self, op: Operation) -> Result<()> {
        match op {
            Operation::Deposit => {
                if self.emergency_stop {
                    return Err(EscrowError::EmergencyStopActive);
                }
                if self.paused {
                    return Err(EscrowError::Paused);
                }
                Ok(())
            }
            Operation::ReleaseLocked | Operation::CloseSale => {
                if self.emergency_stop {
                    Err(EscrowError::EmergencyStopActive)
                } else {
                    Ok(())
                }
            }
            Operation::ClaimPending => Ok(()),
            Operation::EmergencyWithdraw => {
                if self.emergency_stop {
                    Ok(())
                } else {
                    Err(EscrowError::EmergencyStopInactive)
                }
            }
        }
    }
}
