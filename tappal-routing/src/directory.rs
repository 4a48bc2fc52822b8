//! Officer directory.
//!
//! Read-only lookup of officers by ID.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use tappal_access::Officer;

use crate::error::RemoteError;

/// Contract for officer lookup.
#[async_trait]
pub trait OfficerDirectory: Send + Sync {
    /// Resolve an officer by ID.
    async fn lookup(&self, officer_id: &str) -> Result<Option<Officer>, RemoteError>;

    /// All officers, ordered by ID.
    async fn list(&self) -> Result<Vec<Officer>, RemoteError>;
}

/// In-process officer directory.
pub struct InMemoryDirectory {
    officers: Arc<RwLock<HashMap<String, Officer>>>,
    available: AtomicBool,
    lookups: AtomicU32,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::from_officers(Vec::new())
    }

    /// Create a directory holding the given officers.
    pub fn from_officers(officers: impl IntoIterator<Item = Officer>) -> Self {
        Self {
            officers: Arc::new(RwLock::new(
                officers.into_iter().map(|o| (o.id.clone(), o)).collect(),
            )),
            available: AtomicBool::new(true),
            lookups: AtomicU32::new(0),
        }
    }

    /// Add or replace an officer record.
    pub async fn register(&self, officer: Officer) {
        let mut officers = self.officers.write().await;
        officers.insert(officer.id.clone(), officer);
    }

    /// Set availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of lookups served or attempted.
    pub fn lookup_count(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), RemoteError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("officer directory offline".to_string()))
        }
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OfficerDirectory for InMemoryDirectory {
    async fn lookup(&self, officer_id: &str) -> Result<Option<Officer>, RemoteError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        Ok(self.officers.read().await.get(officer_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Officer>, RemoteError> {
        self.ensure_available()?;
        let mut officers: Vec<Officer> = self.officers.read().await.values().cloned().collect();
        officers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(officers)
    }
}
