//! Error types for tappal routing.

use tappal_access::TransitionError;

use crate::forwarding::ForwardError;
use crate::ledger::LedgerError;

/// Failure reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Credential rejected (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credential valid but not permitted (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Collaborator not reachable
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    /// 401 and 403 mean the stored credential can no longer be trusted.
    pub fn invalidates_session(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Forbidden(_))
    }
}

/// Error types for the tappal store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No tappal with this ID
    #[error("Tappal not found: {0}")]
    TappalNotFound(String),

    /// Insert collided with an existing tappal
    #[error("Tappal already exists: {0}")]
    Duplicate(String),

    /// Caller's copy is stale
    #[error("Version conflict on {tappal_id}: expected {expected}, found {actual}")]
    Conflict {
        tappal_id: String,
        expected: u64,
        actual: u64,
    },

    /// Commit was built from a copy whose holder or status is not the stored one
    #[error("Stored {field} of {tappal_id} is {actual}, commit expected {expected}")]
    Diverged {
        tappal_id: String,
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// Ledger integrity failure
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Remote store failure
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// An action gated by the capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Forward,
    ChangeStatus,
    Comment,
    DeleteComment,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Forward => "forward",
            Self::ChangeStatus => "change-status",
            Self::Comment => "comment",
            Self::DeleteComment => "delete-comment",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for routing operations.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// Status change failed validation
    #[error("Invalid status change: {0}")]
    InvalidTransition(#[from] TransitionError),

    /// Forward failed validation
    #[error("Invalid forward: {0}")]
    InvalidForward(#[from] ForwardError),

    /// Comment failed validation
    #[error("Invalid comment: {0}")]
    InvalidComment(String),

    /// Caller attempted an action outside its capability set
    #[error("Officer {officer_id} may not {action} tappal {tappal_id}")]
    CapabilityViolation {
        officer_id: String,
        tappal_id: String,
        action: Action,
    },

    /// Session credential missing or invalidated
    #[error("Session expired, sign in again")]
    Unauthenticated,

    /// Tappal does not exist
    #[error("Tappal not found: {0}")]
    NotFound(String),

    /// Intake collided with an existing tappal
    #[error("Tappal already exists: {0}")]
    AlreadyExists(String),

    /// Comment does not exist
    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    /// Officer referenced by a tappal is missing from the directory
    #[error("Officer not found: {0}")]
    OfficerNotFound(String),

    /// Caller's copy is stale
    #[error("Tappal {tappal_id} changed since it was loaded (expected version {expected}, found {actual})")]
    Conflict {
        tappal_id: String,
        expected: u64,
        actual: u64,
    },

    /// Caller's copy disagrees with the stored tappal
    #[error("Tappal {tappal_id} has {field} {actual}, not {expected}; reload it")]
    Diverged {
        tappal_id: String,
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// Ledger integrity failure
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Collaborator failure
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

impl From<StoreError> for RoutingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TappalNotFound(id) => Self::NotFound(id),
            StoreError::Duplicate(id) => Self::AlreadyExists(id),
            StoreError::Conflict {
                tappal_id,
                expected,
                actual,
            } => Self::Conflict {
                tappal_id,
                expected,
                actual,
            },
            StoreError::Diverged {
                tappal_id,
                field,
                expected,
                actual,
            } => Self::Diverged {
                tappal_id,
                field,
                expected,
                actual,
            },
            StoreError::Ledger(e) => Self::Ledger(e),
            StoreError::Remote(e) => Self::Remote(e),
        }
    }
}

impl RoutingError {
    /// Validation failures are rejected before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition(_) | Self::InvalidForward(_) | Self::InvalidComment(_)
        )
    }

    /// Remote failures may succeed on retry; a conflict succeeds after a reload.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(e) => !e.invalidates_session(),
            Self::Conflict { .. } | Self::Diverged { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
