//! Append-only, hash-chained event log.
//!
//! Records are prepared while an operation is still open and only appended
//! once it commits, so an aborted operation never leaves a record behind.
//! Each record commits to its predecessor:
//!
//! ```text
//! hash = SHA-256(domain || prev_hash || sequence || escrow || recorded_at || event_json)
//! ```
//!
//! Observers register an [`EventSink`] and see every committed record once,
//! in order.

use ondrix_types::{
    EscrowError, EscrowEvent, EscrowId, EventId, EventRecord, Result, constants,
};
use sha2::{Digest, Sha256};

/// Observer of committed records (dashboards, indexers).
pub trait EventSink: Send {
    fn on_event(&mut self, record: &EventRecord);
}

/// Sink that keeps a copy of everything it sees.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub records: Vec<EventRecord>,
}

impl EventSink for CollectingSink {
    fn on_event(&mut self, record: &EventRecord) {
        self.records.push(record.clone());
    }
}

/// Hash-chained log of one escrow's events.
#[derive(Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("records", &self.records.len())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    fn head(&self) -> [u8; 32] {
        self.records.last().map_or([0u8; 32], |r| r.hash)
    }

    fn next_sequence(&self) -> u64 {
        self.records.len() as u64
    }

    /// Build chained records for `events` without appending them.
    ///
    /// # Errors
    /// Returns `Serialization` if an event cannot be encoded.
    pub fn prepare(
        &self,
        escrow: EscrowId,
        recorded_at: i64,
        events: Vec<EscrowEvent>,
    ) -> Result<Vec<EventRecord>> {
        let mut prev_hash = self.head();
        let mut sequence = self.next_sequence();
        let mut prepared = Vec::with_capacity(events.len());
        for event in events {
            let hash = compute_hash(&prev_hash, sequence, &escrow, recorded_at, &event)?;
            prepared.push(EventRecord {
                id: EventId::new(),
                sequence,
                escrow,
                recorded_at,
                event,
                prev_hash,
                hash,
            });
            prev_hash = hash;
            sequence += 1;
        }
        Ok(prepared)
    }

    /// Check that `records` start exactly at the current head.
    ///
    /// # Errors
    /// Returns `Internal` if the records do not extend the current head.
    pub fn check_extends(&self, records: &[EventRecord]) -> Result<()> {
        match records.first() {
            Some(first)
                if first.prev_hash != self.head() || first.sequence != self.next_sequence() =>
            {
                Err(EscrowError::Internal(format!(
                    "event record {} does not extend the log head",
                    first.sequence
                )))
            }
            _ => Ok(()),
        }
    }

    /// Append records produced by [`EventLog::prepare`] and notify sinks.
    ///
    /// # Errors
    /// Returns `Internal` if the records do not extend the current head.
    pub fn append(&mut self, records: Vec<EventRecord>) -> Result<()> {
        self.check_extends(&records)?;
        self.publish(records);
        Ok(())
    }

    /// Append records already checked with [`EventLog::check_extends`].
    pub(crate) fn publish(&mut self, records: Vec<EventRecord>) {
        for record in records {
            for sink in &mut self.sinks {
                sink.on_event(&record);
            }
            self.records.push(record);
        }
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute every link of the chain.
    ///
    /// # Errors
    /// Returns `Internal` naming the first record that fails to verify.
    pub fn verify_chain(&self) -> Result<()> {
        verify_records(&self.records)
    }
}

/// Verify a standalone slice of records, e.g. one exported to an indexer.
pub fn verify_records(records: &[EventRecord]) -> Result<()> {
    let mut prev_hash = [0u8; 32];
    for (index, record) in records.iter().enumerate() {
        let expected = compute_hash(
            &prev_hash,
            record.sequence,
            &record.escrow,
            record.recorded_at,
            &record.event,
        )?;
        if record.sequence != index as u64 || record.prev_hash != prev_hash || record.hash != expected
        {
            return Err(EscrowError::Internal(format!(
                "event chain broken at record {index} ({})",
                hex::encode(record.hash)
            )));
        }
        prev_hash = record.hash;
    }
    Ok(())
}

fn compute_hash(
    prev_hash: &[u8; 32],
    sequence: u64,
    escrow: &EscrowId,
    recorded_at: i64,
    event: &EscrowEvent,
) -> Result<[u8; 32]> {
    let body = serde_json::to_vec(event)?;
    let mut hasher = Sha256::new();
    hasher.update(constants::EVENT_HASH_DOMAIN);
    hasher.update(prev_hash);
    hasher.update(sequence.to_le_bytes());
    hasher.update(escrow.0);
    hasher.update(recorded_at.to_le_bytes());
    hasher.update(&body);
    Ok(hasher.finalize().into())
}
