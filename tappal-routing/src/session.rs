//! Session credential.

use tokio::sync::RwLock;

use tappal_access::Officer;

/// The signed-in officer and the credential presented to collaborators.
///
/// Once invalidated the session stays invalid; the officer must sign in
/// again to obtain a new one.
#[derive(Debug)]
pub struct Session {
    officer: Officer,
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new(officer: Officer, token: impl Into<String>) -> Self {
        Self {
            officer,
            token: RwLock::new(Some(token.into())),
        }
    }

    /// The officer this session belongs to.
    pub fn officer(&self) -> &Officer {
        &self.officer
    }

    /// Current credential, if still valid.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Discard the stored credential.
    pub async fn invalidate(&self) {
        let mut token = self.token.write().await;
        if token.take().is_some() {
            tracing::warn!(officer_id = %self.officer.id, "Session credential invalidated");
        }
    }
}
