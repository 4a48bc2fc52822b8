//! YAML fixtures.
//!
//! A fixture is a complete snapshot of officers, tappals, movements and
//! comments. Loading one builds the in-memory collaborators; capturing
//! writes their state back out.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use tappal_access::{Comment, Movement, Officer, Tappal};

use crate::comments::InMemoryCommentStore;
use crate::directory::{InMemoryDirectory, OfficerDirectory};
use crate::error::{RemoteError, StoreError};
use crate::ledger::{LedgerError, MovementLedger};
use crate::store::{InMemoryTappalStore, StatusChange, TappalStore};

/// Error types for fixture handling.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to access fixture file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Persisted movements fail chain verification
    #[error("Fixture ledger rejected: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] RemoteError),
}

/// In-memory collaborators built from a fixture.
#[derive(Clone)]
pub struct FixtureStores {
    pub store: Arc<InMemoryTappalStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub comments: Arc<InMemoryCommentStore>,
}

/// Serialized system state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub officers: Vec<Officer>,
    #[serde(default)]
    pub tappals: Vec<Tappal>,
    #[serde(default)]
    pub movements: Vec<Movement>,
    #[serde(default)]
    pub status_changes: Vec<StatusChange>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Fixture {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Read a fixture file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let yaml = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&yaml)?)
    }

    /// Write a fixture file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FixtureError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Build collaborators holding this state.
    ///
    /// Movements without a digest are sealed on load; sealed ones must
    /// verify.
    pub fn into_stores(self) -> Result<FixtureStores, FixtureError> {
        let ledger = MovementLedger::restore(self.movements)?;

        tracing::debug!(
            officers = self.officers.len(),
            tappals = self.tappals.len(),
            movements = ledger.total(),
            "Loaded fixture"
        );

        Ok(FixtureStores {
            store: Arc::new(InMemoryTappalStore::from_parts(
                self.tappals,
                ledger,
                self.status_changes,
            )),
            directory: Arc::new(InMemoryDirectory::from_officers(self.officers)),
            comments: Arc::new(InMemoryCommentStore::from_comments(self.comments)),
        })
    }

    /// Capture the current state of fixture-backed collaborators.
    pub async fn capture(stores: &FixtureStores) -> Result<Self, FixtureError> {
        let snapshot = stores.store.snapshot().await?;
        Ok(Self {
            officers: stores.directory.list().await?,
            tappals: snapshot.tappals,
            movements: snapshot.movements,
            status_changes: snapshot.status_changes,
            comments: stores.comments.all().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
officers:
  - { id: O1, name: Ravi, role: tahsildar, department: Revenue }
  - { id: O4, name: Lakshmi, role: naib_tahsildar, department: Revenue }
tappals:
  - id: T1
    subject: Encroachment on canal bund
    department: Revenue
    status: In Progress
    created_at: 2026-03-02T09:30:00Z
    assigned_to: O4
movements:
  - id: M1
    tappal_id: T1
    from: { id: O1, name: Ravi, role: tahsildar }
    to: { id: O4, name: Lakshmi, role: naib_tahsildar }
    reason: field verification
    status: forwarded
    timestamp: 2026-03-02T10:00:00Z
"#;

    #[tokio::test]
    async fn test_load_and_capture() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        let stores = fixture.into_stores().unwrap();

        let tappal = stores.store.load("T1").await.unwrap().unwrap();
        assert_eq!(tappal.assigned_to, "O4");
        stores.store.verify_history("T1").await.unwrap();

        let captured = Fixture::capture(&stores).await.unwrap();
        assert_eq!(captured.officers.len(), 2);
        assert_eq!(captured.movements.len(), 1);
        assert!(!captured.movements[0].digest.is_empty());

        // sealed movements survive a second load
        let reloaded = Fixture::from_yaml(&captured.to_yaml().unwrap()).unwrap();
        assert!(reloaded.into_stores().is_ok());
    }

    #[test]
    fn test_tampered_movement_rejected() {
        let stores = Fixture::from_yaml(FIXTURE).unwrap().into_stores().unwrap();
        let mut movement = tokio_test::block_on(stores.store.snapshot())
            .unwrap()
            .movements
            .remove(0);
        movement.reason = "rewritten".to_string();

        let fixture = Fixture {
            movements: vec![movement],
            ..Default::default()
        };
        assert!(matches!(
            fixture.into_stores(),
            Err(FixtureError::Ledger(LedgerError::BrokenChain { .. }))
        ));
    }
}
