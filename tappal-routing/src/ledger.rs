//! Movement ledger.
//!
//! Append-only record of custody transfers, kept per tappal. Each entry is
//! sealed with a SHA256 digest chained to the previous entry of the same
//! tappal, so an edited or dropped entry shows up in [`MovementLedger::verify_chain`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use tappal_access::{Movement, MovementStatus, OfficerSnapshot};

/// Digest used as the predecessor of a tappal's first movement.
pub const GENESIS_DIGEST: &str = "genesis";

/// Error types for ledger integrity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// An entry's digest does not match its contents and predecessor
    #[error("Broken chain for tappal {tappal_id} at movement {movement_id} (position {position})")]
    BrokenChain {
        tappal_id: String,
        movement_id: String,
        position: usize,
    },

    /// Two restored entries share an ID
    #[error("Duplicate movement: {0}")]
    DuplicateMovement(String),
}

/// Append-only movement ledger.
#[derive(Debug, Clone, Default)]
pub struct MovementLedger {
    /// Entries per tappal, in insertion order
    entries: HashMap<String, Vec<Movement>>,
    /// Next ledger-wide sequence number
    next_sequence: u64,
}

impl MovementLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a movement stamped now.
    pub fn append(
        &mut self,
        tappal_id: &str,
        from: OfficerSnapshot,
        to: OfficerSnapshot,
        reason: impl Into<String>,
        status: MovementStatus,
    ) -> Movement {
        self.append_at(tappal_id, from, to, reason, status, Utc::now())
    }

    /// Append a movement with an explicit timestamp.
    pub fn append_at(
        &mut self,
        tappal_id: &str,
        from: OfficerSnapshot,
        to: OfficerSnapshot,
        reason: impl Into<String>,
        status: MovementStatus,
        timestamp: DateTime<Utc>,
    ) -> Movement {
        let chain = self.entries.entry(tappal_id.to_string()).or_default();
        let previous = chain
            .last()
            .map(|m| m.digest.clone())
            .unwrap_or_else(|| GENESIS_DIGEST.to_string());

        let mut movement = Movement {
            id: uuid::Uuid::new_v4().to_string(),
            tappal_id: tappal_id.to_string(),
            sequence: self.next_sequence,
            from,
            to,
            reason: reason.into(),
            status,
            timestamp,
            digest: String::new(),
        };
        movement.digest = seal(&previous, &movement);

        self.next_sequence += 1;
        chain.push(movement.clone());

        tracing::debug!(
            tappal_id = %tappal_id,
            movement_id = %movement.id,
            sequence = movement.sequence,
            "Appended movement"
        );

        movement
    }

    /// History of a tappal, ascending by timestamp, ties in insertion order.
    pub fn history_of(&self, tappal_id: &str) -> Vec<Movement> {
        let mut history = self.entries.get(tappal_id).cloned().unwrap_or_default();
        history.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.sequence.cmp(&b.sequence))
        });
        history
    }

    /// Number of movements recorded for a tappal.
    pub fn len(&self, tappal_id: &str) -> usize {
        self.entries.get(tappal_id).map(Vec::len).unwrap_or(0)
    }

    /// Total movements across all tappals.
    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Every movement, in insertion order.
    pub fn all(&self) -> Vec<Movement> {
        let mut all: Vec<Movement> = self.entries.values().flatten().cloned().collect();
        all.sort_by_key(|m| m.sequence);
        all
    }

    /// Recompute every digest of a tappal's chain.
    pub fn verify_chain(&self, tappal_id: &str) -> Result<(), LedgerError> {
        let Some(chain) = self.entries.get(tappal_id) else {
            return Ok(());
        };

        let mut previous = GENESIS_DIGEST.to_string();
        for (position, movement) in chain.iter().enumerate() {
            if seal(&previous, movement) != movement.digest {
                return Err(LedgerError::BrokenChain {
                    tappal_id: tappal_id.to_string(),
                    movement_id: movement.id.clone(),
                    position,
                });
            }
            previous = movement.digest.clone();
        }

        Ok(())
    }

    /// Rebuild a ledger from persisted movements.
    ///
    /// Input order is insertion order. Entries carrying a digest must chain
    /// correctly; entries with an empty digest (hand-written fixtures) are
    /// sealed on the way in.
    pub fn restore(movements: impl IntoIterator<Item = Movement>) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        let mut seen = std::collections::HashSet::new();

        for mut movement in movements {
            if !seen.insert(movement.id.clone()) {
                return Err(LedgerError::DuplicateMovement(movement.id));
            }

            let chain = ledger.entries.entry(movement.tappal_id.clone()).or_default();
            let previous = chain
                .last()
                .map(|m| m.digest.clone())
                .unwrap_or_else(|| GENESIS_DIGEST.to_string());
            let expected = seal(&previous, &movement);

            if movement.digest.is_empty() {
                movement.digest = expected;
            } else if movement.digest != expected {
                return Err(LedgerError::BrokenChain {
                    tappal_id: movement.tappal_id.clone(),
                    movement_id: movement.id.clone(),
                    position: chain.len(),
                });
            }

            movement.sequence = ledger.next_sequence;
            ledger.next_sequence += 1;
            chain.push(movement);
        }

        Ok(ledger)
    }
}

/// Compute the digest of `movement` chained to `previous`.
///
/// Sequence numbers are not covered; restore reassigns them.
pub fn seal(previous: &str, movement: &Movement) -> String {
    let mut hasher = Sha256::new();
    let parts: [&str; 9] = [
        previous,
        &movement.id,
        &movement.tappal_id,
        &movement.from.id,
        movement.from.role.as_str(),
        &movement.to.id,
        movement.to.role.as_str(),
        &movement.reason,
        movement.status.as_str(),
    ];
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(
        movement
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
            .as_bytes(),
    );
    hex::encode(hasher.finalize())
}

/// A break in the custody path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathGap {
    /// `to` of one movement differs from `from` of the next
    Discontinuity {
        after_movement: String,
        expected_from: String,
        actual_from: String,
    },
    /// Last recipient is not the current holder
    HolderMismatch {
        last_recipient: String,
        assigned_to: String,
    },
}

/// Report where a history fails to form a simple custody path ending at
/// the current holder. An empty history has no gaps.
pub fn path_gaps(history: &[Movement], assigned_to: &str) -> Vec<PathGap> {
    let mut gaps: Vec<PathGap> = history
        .windows(2)
        .filter(|pair| pair[0].to.id != pair[1].from.id)
        .map(|pair| PathGap::Discontinuity {
            after_movement: pair[0].id.clone(),
            expected_from: pair[0].to.id.clone(),
            actual_from: pair[1].from.id.clone(),
        })
        .collect();

    if let Some(last) = history.last() {
        if last.to.id != assigned_to {
            gaps.push(PathGap::HolderMismatch {
                last_recipient: last.to.id.clone(),
                assigned_to: assigned_to.to_string(),
            });
        }
    }

    gaps
}
