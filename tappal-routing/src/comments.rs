//! Comment store.
//!
//! Comments hang off a tappal but are stored separately, and deleting one is
//! authorized by authorship rather than by tappal access.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use tappal_access::{Comment, Officer, RoleHierarchy};

use crate::error::RemoteError;

/// Contract for the comment collaborator.
///
/// Every call carries the session credential.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments on a tappal, oldest first.
    async fn list(&self, token: &str, tappal_id: &str) -> Result<Vec<Comment>, RemoteError>;

    /// Fetch one comment.
    async fn get(&self, token: &str, comment_id: &str) -> Result<Option<Comment>, RemoteError>;

    /// Store a new comment.
    async fn create(&self, token: &str, comment: Comment) -> Result<Comment, RemoteError>;

    /// Remove a comment. Returns false if it did not exist.
    async fn delete(&self, token: &str, comment_id: &str) -> Result<bool, RemoteError>;
}

/// Check whether an officer may delete a comment: its author, or an
/// administrator.
pub fn can_delete(hierarchy: &RoleHierarchy, officer: &Officer, comment: &Comment) -> bool {
    comment.author_id == officer.id || hierarchy.is_administrator(officer.role)
}

/// In-process comment store.
///
/// A failure can be injected to simulate the remote rejecting the
/// credential.
pub struct InMemoryCommentStore {
    comments: Arc<RwLock<Vec<Comment>>>,
    failure: Arc<RwLock<Option<RemoteError>>>,
    call_count: AtomicU32,
}

impl InMemoryCommentStore {
    pub fn new() -> Self {
        Self::from_comments(Vec::new())
    }

    pub fn from_comments(comments: Vec<Comment>) -> Self {
        Self {
            comments: Arc::new(RwLock::new(comments)),
            failure: Arc::new(RwLock::new(None)),
            call_count: AtomicU32::new(0),
        }
    }

    /// Make every subsequent call fail with `error`, or clear with `None`.
    pub async fn fail_with(&self, error: Option<RemoteError>) {
        *self.failure.write().await = error;
    }

    /// Get call count.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every stored comment.
    pub async fn all(&self) -> Vec<Comment> {
        self.comments.read().await.clone()
    }

    async fn check(&self, token: &str) -> Result<(), RemoteError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.read().await.clone() {
            return Err(err);
        }
        if token.is_empty() {
            return Err(RemoteError::Unauthorized("missing credential".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryCommentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn list(&self, token: &str, tappal_id: &str) -> Result<Vec<Comment>, RemoteError> {
        self.check(token).await?;
        let mut comments: Vec<Comment> = self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.tappal_id == tappal_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn get(&self, token: &str, comment_id: &str) -> Result<Option<Comment>, RemoteError> {
        self.check(token).await?;
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .find(|c| c.id == comment_id)
            .cloned())
    }

    async fn create(&self, token: &str, comment: Comment) -> Result<Comment, RemoteError> {
        self.check(token).await?;
        self.comments.write().await.push(comment.clone());
        Ok(comment)
    }

    async fn delete(&self, token: &str, comment_id: &str) -> Result<bool, RemoteError> {
        self.check(token).await?;
        let mut comments = self.comments.write().await;
        let before = comments.len();
        comments.retain(|c| c.id != comment_id);
        Ok(comments.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tappal_access::Role;

    #[test]
    fn test_can_delete() {
        let hierarchy = RoleHierarchy::standard();
        let author = Officer::new("O1", "Ravi", Role::Tahsildar, "Revenue");
        let rdo = Officer::new("O2", "Meena", Role::Rdo, "Revenue");
        let joint = Officer::new("O7", "Farah", Role::JointCollector, "Revenue");
        let comment = Comment::new("T1", &author, "Survey sketch attached");

        assert!(can_delete(&hierarchy, &author, &comment));
        assert!(can_delete(&hierarchy, &joint, &comment));
        // seniority alone is not enough
        assert!(!can_delete(&hierarchy, &rdo, &comment));
    }

    #[tokio::test]
    async fn test_crud() {
        let store = InMemoryCommentStore::new();
        let author = Officer::new("O1", "Ravi", Role::Tahsildar, "Revenue");
        let comment = store
            .create("token", Comment::new("T1", &author, "Field visit done"))
            .await
            .unwrap();
        store
            .create("token", Comment::new("T2", &author, "Other file"))
            .await
            .unwrap();

        assert_eq!(store.list("token", "T1").await.unwrap().len(), 1);
        assert!(store.get("token", &comment.id).await.unwrap().is_some());
        assert!(store.delete("token", &comment.id).await.unwrap());
        assert!(!store.delete("token", &comment.id).await.unwrap());
        assert_eq!(store.call_count(), 6);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryCommentStore::new();
        store
            .fail_with(Some(RemoteError::Unauthorized("expired".into())))
            .await;
        let err = store.list("token", "T1").await.unwrap_err();
        assert!(err.invalidates_session());

        store.fail_with(None).await;
        assert!(store.list("token", "T1").await.is_ok());
    }
}
