//! Value conservation checker.
//!
//! Invariant enforced before every commit:
//! ```text
//! total_value_deposited == Σ(locked_value) + Σ(pending credits) + total_value_claimed
//! total_value_withdrawn ≤ total_value_deposited
//! ```
//!
//! Released value is not a separate bucket: a release moves value from an
//! investor's lock into the recipient's pending credit, so it is already
//! counted once in `Σ(pending)` or `claimed`.
//!
//! While no emergency sweep has happened, custody must also hold exactly
//! what is still owed: `native custody == Σ(locked) + Σ(pending)`.

use ondrix_types::{EscrowError, Result};
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;

/// Snapshot of every value bucket of one escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservationReport {
    pub total_deposited: u64,
    /// Value released from locks into the withdrawal queue.
    pub total_released: u64,
    /// Value that left custody through claims.
    pub total_claimed: u64,
    pub total_locked: u64,
    pub total_pending: u64,
}

impl ConservationReport {
    /// Collect the buckets from `ledger`.
    ///
    /// # Errors
    /// `NotInitialized` before Initialize, `Overflow` if a sum overflows.
    pub fn from_ledger(ledger: &Ledger) -> Result<Self> {
        let escrow = ledger.escrow()?;
        Ok(Self {
            total_deposited: escrow.total_value_deposited,
            total_released: escrow.total_value_withdrawn,
            total_claimed: escrow.total_value_claimed,
            total_locked: ledger.total_locked()?,
            total_pending: ledger.total_pending()?,
        })
    }

    /// Value still held on behalf of investors or payees.
    pub fn owed(&self) -> Result<u64> {
        self.total_locked
            .checked_add(self.total_pending)
            .ok_or(EscrowError::Overflow)
    }

    /// `locked + pending + claimed`; must equal `total_deposited`.
    pub fn accounted(&self) -> Result<u64> {
        self.owed()?
            .checked_add(self.total_claimed)
            .ok_or(EscrowError::Overflow)
    }

    /// Check the ledger-side invariants.
    ///
    /// # Errors
    /// Returns [`EscrowError::ConservationViolation`] on any imbalance.
    pub fn verify(&self) -> Result<()> {
        let accounted = self.accounted()?;
        if accounted != self.total_deposited {
            return Err(EscrowError::ConservationViolation {
                reason: format!(
                    "deposited {} != locked {} + pending {} + claimed {}",
                    self.total_deposited, self.total_locked, self.total_pending, self.total_claimed
                ),
            });
        }
        if self.total_released > self.total_deposited {
            return Err(EscrowError::ConservationViolation {
                reason: format!(
                    "released {} exceeds deposited {}",
                    self.total_released, self.total_deposited
                ),
            });
        }
        Ok(())
    }

    /// Check that custody holds exactly what is still owed.
    ///
    /// # Errors
    /// Returns [`EscrowError::ConservationViolation`] on drift in either direction.
    pub fn verify_custody(&self, native_in_custody: u64) -> Result<()> {
        let owed = self.owed()?;
        if native_in_custody != owed {
            return Err(EscrowError::ConservationViolation {
                reason: format!(
                    "custody holds {native_in_custody}, owed {owed} (locked {} + pending {})",
                    self.total_locked, self.total_pending
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ConservationReport {
        ConservationReport {
            total_deposited: 100,
            total_released: 30,
            total_claimed: 60,
            total_locked: 20,
            total_pending: 20,
        }
    }

    #[test]
    fn balanced_report_verifies() {
        let r = report();
        assert_eq!(r.accounted().unwrap(), 100);
        assert!(r.verify().is_ok());
        assert!(r.verify_custody(40).is_ok());
    }

    #[test]
    fn missing_value_detected() {
        let mut r = report();
        r.total_pending = 19;
        assert!(matches!(
            r.verify(),
            Err(EscrowError::ConservationViolation { .. })
        ));
    }

    #[test]
    fn over_release_detected() {
        let mut r = report();
        r.total_released = 101;
        assert!(r.verify().is_err());
    }

    #[test]
    fn custody_drift_detected_both_ways() {
        let r = report();
        assert!(r.verify_custody(39).is_err());
        assert!(r.verify_custody(41).is_err());
    }

    #[test]
    fn overflow_is_reported() {
        let r = ConservationReport {
            total_deposited: 0,
            total_released: 0,
            total_claimed: 1,
            total_locked: u64::MAX,
            total_pending: 0,
        };
        assert!(matches!(r.accounted(), Err(EscrowError::Overflow)));
    }

    #[test]
    fn report_exports_as_json() {
        let r = report();
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json["total_claimed"], 60);
        assert_eq!(json["total_pending"], 20);
        let back: ConservationReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn report_from_uninitialized_ledger_fails() {
        assert!(matches!(
            ConservationReport::from_ledger(&Ledger::new()),
            Err(EscrowError::NotInitialized)
        ));
    }
}
