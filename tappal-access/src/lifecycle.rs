//! Status state machine.
//!
//! Pure validation and application of status transitions. Persisting a
//! transition is the routing service's job; nothing here touches a store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Tappal, TappalStatus};

/// Default upper bound on reason length, in characters.
pub const DEFAULT_MAX_REASON_LEN: usize = 2000;

/// Error types for status transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Target equals the current status
    #[error("Tappal is already {0}")]
    SameStatus(TappalStatus),

    /// Reason missing or blank
    #[error("A reason is required for every status change")]
    MissingReason,

    /// Reason longer than allowed
    #[error("Reason exceeds {max} characters")]
    ReasonTooLong { max: usize },

    /// Current status is final under the active policy
    #[error("Tappal is {0} and cannot change status")]
    TerminalStatus(TappalStatus),
}

/// Rules that vary by deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPolicy {
    /// Forbid leaving Completed or Rejected
    pub terminal_is_final: bool,
    /// Maximum reason length in characters
    pub max_reason_len: usize,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            terminal_is_final: true,
            max_reason_len: DEFAULT_MAX_REASON_LEN,
        }
    }
}

impl TransitionPolicy {
    /// Policy that allows reopening Completed and Rejected tappals.
    pub fn permissive() -> Self {
        Self {
            terminal_is_final: false,
            ..Default::default()
        }
    }
}

/// Validate a requested transition.
///
/// The same-status check runs first so a repeated request is always
/// reported as such, whatever the reason text.
pub fn check_transition(
    tappal: &Tappal,
    target: TappalStatus,
    reason: &str,
    policy: &TransitionPolicy,
) -> Result<(), TransitionError> {
    if target == tappal.status {
        return Err(TransitionError::SameStatus(target));
    }

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(TransitionError::MissingReason);
    }
    if reason.chars().count() > policy.max_reason_len {
        return Err(TransitionError::ReasonTooLong {
            max: policy.max_reason_len,
        });
    }

    if policy.terminal_is_final && tappal.status.is_terminal() {
        return Err(TransitionError::TerminalStatus(tappal.status));
    }

    Ok(())
}

/// Apply a validated transition, returning the new tappal state.
///
/// `completed_at` follows the status: stamped on entering Completed,
/// cleared on leaving it.
pub fn apply_transition(tappal: &Tappal, target: TappalStatus, at: DateTime<Utc>) -> Tappal {
    let mut next = tappal.clone();
    next.status = target;
    next.completed_at = if target == TappalStatus::Completed {
        Some(at)
    } else {
        None
    };
    next
}

/// Statuses a UI may offer for a tappal in `current`.
pub fn allowed_targets(current: TappalStatus, policy: &TransitionPolicy) -> Vec<TappalStatus> {
    if policy.terminal_is_final && current.is_terminal() {
        return Vec::new();
    }

    TappalStatus::all()
        .into_iter()
        .filter(|s| *s != current)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tappal(status: TappalStatus) -> Tappal {
        let mut t = Tappal::new("T1", "Pension arrears", "Revenue", "O1");
        t.status = status;
        if status == TappalStatus::Completed {
            t.completed_at = Some(Utc::now());
        }
        t
    }

    #[test]
    fn test_same_status_rejected_for_any_reason() {
        let policy = TransitionPolicy::default();
        for status in TappalStatus::all() {
            let t = tappal(status);
            for reason in ["", "   ", "valid reason"] {
                assert_eq!(
                    check_transition(&t, status, reason, &policy),
                    Err(TransitionError::SameStatus(status))
                );
            }
        }
    }

    #[test]
    fn test_blank_reason_rejected() {
        let policy = TransitionPolicy::default();
        let t = tappal(TappalStatus::Pending);
        for target in TappalStatus::all().into_iter().filter(|s| *s != t.status) {
            assert_eq!(
                check_transition(&t, target, " \t", &policy),
                Err(TransitionError::MissingReason)
            );
        }
    }

    #[test]
    fn test_reason_length_limit() {
        let policy = TransitionPolicy {
            max_reason_len: 5,
            ..Default::default()
        };
        let t = tappal(TappalStatus::Pending);
        assert_eq!(
            check_transition(&t, TappalStatus::InProgress, "too long", &policy),
            Err(TransitionError::ReasonTooLong { max: 5 })
        );
        assert!(check_transition(&t, TappalStatus::InProgress, "short", &policy).is_ok());
    }

    #[test]
    fn test_terminal_policy() {
        let t = tappal(TappalStatus::Rejected);

        let strict = TransitionPolicy::default();
        assert_eq!(
            check_transition(&t, TappalStatus::Pending, "reopened", &strict),
            Err(TransitionError::TerminalStatus(TappalStatus::Rejected))
        );
        assert!(allowed_targets(TappalStatus::Rejected, &strict).is_empty());

        let permissive = TransitionPolicy::permissive();
        assert!(check_transition(&t, TappalStatus::Pending, "reopened", &permissive).is_ok());
        assert_eq!(allowed_targets(TappalStatus::Rejected, &permissive).len(), 4);
    }

    #[test]
    fn test_completed_at_follows_status() {
        let now = Utc::now();
        let done = apply_transition(&tappal(TappalStatus::UnderReview), TappalStatus::Completed, now);
        assert_eq!(done.status, TappalStatus::Completed);
        assert_eq!(done.completed_at, Some(now));
        assert!(done.completion_consistent());

        let reopened = apply_transition(&done, TappalStatus::InProgress, now);
        assert!(reopened.completed_at.is_none());
        assert!(reopened.completion_consistent());
    }
}
