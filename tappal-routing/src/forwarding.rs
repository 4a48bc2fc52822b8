//! Forwarding protocol rules.
//!
//! Local checks run before any directory or store call; target checks run
//! once the target officer has been resolved.

use serde::Serialize;
use tappal_access::{Capabilities, Movement, Officer, Role, RoleHierarchy, Tappal};

use crate::ledger::PathGap;

/// Reasons a forward request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    #[error("A reason is required to forward a tappal")]
    MissingReason,

    #[error("Reason exceeds {max} characters")]
    ReasonTooLong { max: usize },

    #[error("No target officer selected")]
    MissingTarget,

    #[error("Cannot forward a tappal to yourself")]
    SelfForward,

    #[error("Tappal is already assigned to this officer")]
    AlreadyAssigned,

    #[error("Unknown officer: {0}")]
    UnknownOfficer(String),

    /// Role never receives routed work
    #[error("Tappals cannot be forwarded to a {0}")]
    NonRoutableTarget(Role),
}

/// Validate a forward request using only local data.
pub fn check_request(
    requester: &Officer,
    tappal: &Tappal,
    to_officer_id: &str,
    reason: &str,
    max_reason_len: usize,
) -> Result<(), ForwardError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ForwardError::MissingReason);
    }
    if reason.chars().count() > max_reason_len {
        return Err(ForwardError::ReasonTooLong {
            max: max_reason_len,
        });
    }
    if to_officer_id.trim().is_empty() {
        return Err(ForwardError::MissingTarget);
    }
    if to_officer_id == requester.id {
        return Err(ForwardError::SelfForward);
    }
    if to_officer_id == tappal.assigned_to {
        return Err(ForwardError::AlreadyAssigned);
    }
    Ok(())
}

/// Validate a resolved target officer.
pub fn check_target(hierarchy: &RoleHierarchy, target: &Officer) -> Result<(), ForwardError> {
    if !hierarchy.receives_routed_work(target.role) {
        return Err(ForwardError::NonRoutableTarget(target.role));
    }
    Ok(())
}

/// Officers a requester may pick as the next holder, in directory order.
pub fn eligible_targets<'a>(
    hierarchy: &RoleHierarchy,
    requester: &Officer,
    tappal: &Tappal,
    officers: &'a [Officer],
) -> Vec<&'a Officer> {
    officers
        .iter()
        .filter(|o| o.id != requester.id && o.id != tappal.assigned_to)
        .filter(|o| hierarchy.receives_routed_work(o.role))
        .collect()
}

/// Result of a committed forward.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardOutcome {
    /// Authoritative tappal after the commit
    pub tappal: Tappal,
    /// The appended movement
    pub movement: Movement,
    /// Requester's capabilities after the reassignment
    pub capabilities: Capabilities,
    /// Path discontinuities in the updated history
    pub path_gaps: Vec<PathGap>,
}
