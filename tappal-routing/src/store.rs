//! Tappal store.
//!
//! The remote record store that holds tappals, their movement ledger and
//! their status history. [`TappalStore`] is the contract the routing
//! service consumes; [`InMemoryTappalStore`] keeps everything behind one
//! lock so a forward commit is all-or-nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use tappal_access::{Movement, MovementStatus, OfficerSnapshot, Tappal, TappalStatus};

use crate::error::{RemoteError, StoreError};
use crate::ledger::MovementLedger;

/// Reassignment plus ledger append, committed as one unit.
#[derive(Debug, Clone)]
pub struct ForwardCommit {
    pub tappal_id: String,
    /// Version the caller's copy was loaded at
    pub expected_version: u64,
    /// Current holder
    pub from: OfficerSnapshot,
    /// New holder
    pub to: OfficerSnapshot,
    pub reason: String,
}

/// Result of a committed forward.
#[derive(Debug, Clone)]
pub struct ForwardReceipt {
    /// Authoritative tappal state after the commit
    pub tappal: Tappal,
    /// The appended movement
    pub movement: Movement,
}

/// Status change to persist.
#[derive(Debug, Clone)]
pub struct StatusCommit {
    pub tappal_id: String,
    /// Version the caller's copy was loaded at
    pub expected_version: u64,
    /// Status the change was validated against
    pub from_status: TappalStatus,
    pub status: TappalStatus,
    /// Stamped when entering Completed, cleared otherwise
    pub completed_at: Option<DateTime<Utc>>,
    pub reason: String,
    /// Officer making the change
    pub changed_by: String,
    pub at: DateTime<Utc>,
}

/// One recorded status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub tappal_id: String,
    pub from: TappalStatus,
    pub to: TappalStatus,
    pub reason: String,
    pub changed_by: String,
    pub at: DateTime<Utc>,
}

/// Everything a store holds, for export.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub tappals: Vec<Tappal>,
    pub movements: Vec<Movement>,
    pub status_changes: Vec<StatusChange>,
}

/// Contract for the tappal record store.
///
/// Mutations take the caller's expected version and fail with
/// [`StoreError::Conflict`] when it is stale, or with
/// [`StoreError::Diverged`] when the holder or status they were built
/// from is not the stored one.
#[async_trait]
pub trait TappalStore: Send + Sync {
    /// Load a tappal by ID.
    async fn load(&self, tappal_id: &str) -> Result<Option<Tappal>, StoreError>;

    /// Register a new tappal (intake).
    async fn insert(&self, tappal: Tappal) -> Result<Tappal, StoreError>;

    /// Movement history, ascending by timestamp.
    async fn history(&self, tappal_id: &str) -> Result<Vec<Movement>, StoreError>;

    /// Check the integrity of a tappal's movement chain.
    async fn verify_history(&self, tappal_id: &str) -> Result<(), StoreError>;

    /// Append a forwarded movement and reassign the tappal atomically.
    async fn commit_forward(&self, commit: ForwardCommit) -> Result<ForwardReceipt, StoreError>;

    /// Persist a status change.
    async fn update_status(&self, commit: StatusCommit) -> Result<Tappal, StoreError>;

    /// Recorded status changes, oldest first.
    async fn status_history(&self, tappal_id: &str) -> Result<Vec<StatusChange>, StoreError>;

    /// Export everything.
    async fn snapshot(&self) -> Result<StoreSnapshot, StoreError>;
}

#[derive(Debug, Default)]
struct StoreState {
    tappals: HashMap<String, Tappal>,
    ledger: MovementLedger,
    status_changes: Vec<StatusChange>,
}

impl StoreState {
    fn check_version(&self, tappal_id: &str, expected: u64) -> Result<&Tappal, StoreError> {
        let tappal = self
            .tappals
            .get(tappal_id)
            .ok_or_else(|| StoreError::TappalNotFound(tappal_id.to_string()))?;

        if tappal.version != expected {
            return Err(StoreError::Conflict {
                tappal_id: tappal_id.to_string(),
                expected,
                actual: tappal.version,
            });
        }

        Ok(tappal)
    }
}

fn diverged(tappal_id: &str, field: &'static str, expected: &str, actual: &str) -> StoreError {
    StoreError::Diverged {
        tappal_id: tappal_id.to_string(),
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// In-process tappal store.
///
/// Tappals, ledger and status log share a single lock. Availability can
/// be toggled to exercise remote-failure paths.
pub struct InMemoryTappalStore {
    state: Arc<RwLock<StoreState>>,
    available: AtomicBool,
    write_count: AtomicU32,
}

impl InMemoryTappalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            available: AtomicBool::new(true),
            write_count: AtomicU32::new(0),
        }
    }

    /// Create a store from persisted records.
    pub fn from_parts(
        tappals: impl IntoIterator<Item = Tappal>,
        ledger: MovementLedger,
        status_changes: Vec<StatusChange>,
    ) -> Self {
        let state = StoreState {
            tappals: tappals.into_iter().map(|t| (t.id.clone(), t)).collect(),
            ledger,
            status_changes,
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            available: AtomicBool::new(true),
            write_count: AtomicU32::new(0),
        }
    }

    /// Set availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of forward and status commits attempted.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("tappal store offline".to_string()).into())
        }
    }
}

impl Default for InMemoryTappalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TappalStore for InMemoryTappalStore {
    async fn load(&self, tappal_id: &str) -> Result<Option<Tappal>, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.tappals.get(tappal_id).cloned())
    }

    async fn insert(&self, tappal: Tappal) -> Result<Tappal, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;

        if state.tappals.contains_key(&tappal.id) {
            return Err(StoreError::Duplicate(tappal.id));
        }

        state.tappals.insert(tappal.id.clone(), tappal.clone());
        tracing::debug!(tappal_id = %tappal.id, "Stored tappal");
        Ok(tappal)
    }

    async fn history(&self, tappal_id: &str) -> Result<Vec<Movement>, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.ledger.history_of(tappal_id))
    }

    async fn verify_history(&self, tappal_id: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        state.ledger.verify_chain(tappal_id)?;
        Ok(())
    }

    async fn commit_forward(&self, commit: ForwardCommit) -> Result<ForwardReceipt, StoreError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        let mut state = self.state.write().await;
        let holder = &state
            .check_version(&commit.tappal_id, commit.expected_version)?
            .assigned_to;
        if *holder != commit.from.id {
            return Err(diverged(&commit.tappal_id, "holder", &commit.from.id, holder));
        }

        // nothing below can fail, so the append and the reassignment land together
        let movement = state.ledger.append(
            &commit.tappal_id,
            commit.from,
            commit.to.clone(),
            commit.reason,
            MovementStatus::Forwarded,
        );

        let tappal = match state.tappals.get_mut(&commit.tappal_id) {
            Some(tappal) => {
                tappal.assigned_to = commit.to.id;
                tappal.version += 1;
                tappal.clone()
            }
            None => return Err(StoreError::TappalNotFound(commit.tappal_id)),
        };

        Ok(ForwardReceipt { tappal, movement })
    }

    async fn update_status(&self, commit: StatusCommit) -> Result<Tappal, StoreError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        let mut state = self.state.write().await;
        let previous = state
            .check_version(&commit.tappal_id, commit.expected_version)?
            .status;
        if previous != commit.from_status {
            return Err(diverged(
                &commit.tappal_id,
                "status",
                commit.from_status.as_str(),
                previous.as_str(),
            ));
        }

        let tappal = match state.tappals.get_mut(&commit.tappal_id) {
            Some(tappal) => {
                tappal.status = commit.status;
                tappal.completed_at = commit.completed_at;
                tappal.version += 1;
                tappal.clone()
            }
            None => return Err(StoreError::TappalNotFound(commit.tappal_id)),
        };

        state.status_changes.push(StatusChange {
            tappal_id: commit.tappal_id,
            from: previous,
            to: commit.status,
            reason: commit.reason,
            changed_by: commit.changed_by,
            at: commit.at,
        });

        Ok(tappal)
    }

    async fn status_history(&self, tappal_id: &str) -> Result<Vec<StatusChange>, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .status_changes
            .iter()
            .filter(|c| c.tappal_id == tappal_id)
            .cloned()
            .collect())
    }

    async fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;

        let mut tappals: Vec<Tappal> = state.tappals.values().cloned().collect();
        tappals.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(StoreSnapshot {
            tappals,
            movements: state.ledger.all(),
            status_changes: state.status_changes.clone(),
        })
    }
}
