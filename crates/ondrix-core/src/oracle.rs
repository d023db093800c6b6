//! Oracle Adapter: validity and freshness rules for price reads.
//!
//! A [`PriceFeed`] is the external price service contract
//! (`latest_price() -> (answer, observed_at)`). The adapter turns a raw
//! answer into a [`PriceObservation`] or rejects it:
//!
//! 1. The feed must be the one the escrow was bound to (`InvalidOracle`)
//! 2. `answer ≤ 0` or `answer > u64::MAX` → `InvalidPrice`
//! 3. `now − observed_at > threshold` → `StalePrice`
//!
//! Reads are synchronous and performed fresh on every deposit.

use std::sync::{Arc, Mutex};

use ondrix_types::{EscrowError, OracleId, PriceObservation, RawPrice, Result};
use tracing::{debug, warn};

/// External price source.
pub trait PriceFeed {
    /// Identity of this feed, matched against the escrow's oracle reference.
    fn feed_id(&self) -> OracleId;

    /// Latest answer. Errors here surface unchanged to the caller.
    fn latest_price(&self) -> Result<RawPrice>;
}

/// Validating reader over a [`PriceFeed`].
#[derive(Debug, Clone, Copy)]
pub struct OracleAdapter {
    expected: OracleId,
    staleness_threshold_secs: u64,
}

impl OracleAdapter {
    #[must_use]
    pub fn new(expected: OracleId, staleness_threshold_secs: u64) -> Self {
        Self {
            expected,
            staleness_threshold_secs,
        }
    }

    /// Identity check alone, used when binding a feed at Initialize.
    pub fn check_feed<F: PriceFeed + ?Sized>(&self, feed: &F) -> Result<()> {
        let id = feed.feed_id();
        if id == self.expected {
            Ok(())
        } else {
            Err(EscrowError::InvalidOracle(id))
        }
    }

    /// Fetch and validate a fresh observation at `now`.
    pub fn read<F: PriceFeed + ?Sized>(&self, feed: &F, now: i64) -> Result<PriceObservation> {
        self.check_feed(feed)?;
        let raw = feed.latest_price()?;
        let observation = self.validate(raw, now)?;
        debug!(
            oracle = %self.expected,
            price = observation.price,
            observed_at = observation.observed_at,
            age = observation.age_at(now),
            "Oracle price read"
        );
        Ok(observation)
    }

    /// Validate a raw answer without touching the feed.
    pub fn validate(&self, raw: RawPrice, now: i64) -> Result<PriceObservation> {
        if raw.answer <= 0 {
            return Err(EscrowError::InvalidPrice {
                reason: format!("non-positive answer {}", raw.answer),
            });
        }
        let price = u64::try_from(raw.answer).map_err(|_| EscrowError::InvalidPrice {
            reason: format!("answer {} out of range", raw.answer),
        })?;
        let observation = PriceObservation {
            price,
            observed_at: raw.observed_at,
        };
        let age = observation.age_at(now);
        if age > self.staleness_threshold_secs {
            warn!(
                oracle = %self.expected,
                age,
                threshold = self.staleness_threshold_secs,
                "Stale price rejected"
            );
            return Err(EscrowError::StalePrice {
                age_secs: age,
                threshold_secs: self.staleness_threshold_secs,
            });
        }
        Ok(observation)
    }
}

/// Feed whose answer is set by hand. Clones share the same answer.
#[derive(Debug, Clone)]
pub struct ManualPriceFeed {
    id: OracleId,
    answer: Arc<Mutex<Option<RawPrice>>>,
}

impl ManualPriceFeed {
    /// A feed with no answer yet; reads fail with `InvalidPrice`.
    #[must_use]
    pub fn new(id: OracleId) -> Self {
        Self {
            id,
            answer: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn with_price(id: OracleId, answer: i128, observed_at: i64) -> Self {
        let feed = Self::new(id);
        feed.set(answer, observed_at);
        feed
    }

    pub fn set(&self, answer: i128, observed_at: i64) {
        if let Ok(mut slot) = self.answer.lock() {
            *slot = Some(RawPrice {
                answer,
                observed_at,
            });
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.answer.lock() {
            *slot = None;
        }
    }
}

impl PriceFeed for ManualPriceFeed {
    fn feed_id(&self) -> OracleId {
        self.id
    }

    fn latest_price(&self) -> Result<RawPrice> {
        let slot = self
            .answer
            .lock()
            .map_err(|_| EscrowError::Internal("price feed lock poisoned".into()))?;
        (*slot).ok_or_else(|| EscrowError::InvalidPrice {
            reason: "feed has no answer".into(),
        })
    }
}
