//! Access control evaluation.
//!
//! Computes the capability set an officer holds on a tappal from three
//! inputs: the officer's role, the tappal's current holder, and the tappal's
//! movement history. Denial is an ordinary result, never an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hierarchy::{RoleHierarchy, Tier};
use crate::types::{Capabilities, Movement, Officer, Tappal};

/// Which rule decided visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessGrant {
    /// Oversight role
    Oversight,
    /// Collector or Joint Collector
    Administrative,
    /// Requester currently holds the tappal
    Assignee,
    /// Requester's role is above the holder's role in the chain
    ChainSuperior,
    /// Requester appears somewhere in the movement history
    LedgerParticipant,
    /// No rule matched
    Denied,
}

impl AccessGrant {
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied)
    }
}

/// Outcome of an access evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub capabilities: Capabilities,
    pub grant: AccessGrant,
}

impl AccessDecision {
    fn denied() -> Self {
        Self {
            capabilities: Capabilities::none(),
            grant: AccessGrant::Denied,
        }
    }
}

/// Evaluates officer capabilities against the role hierarchy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessEvaluator {
    hierarchy: RoleHierarchy,
}

impl AccessEvaluator {
    /// Create an evaluator over the standard hierarchy.
    pub fn new() -> Self {
        Self::with_hierarchy(RoleHierarchy::standard())
    }

    /// Create an evaluator over a specific hierarchy table.
    pub fn with_hierarchy(hierarchy: RoleHierarchy) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Evaluate what `requester` may do with `tappal`.
    ///
    /// `assignee` is the directory record for `tappal.assigned_to`; when it
    /// cannot be resolved the chain rule is skipped. `ledger` is the
    /// tappal's movement history.
    pub fn evaluate(
        &self,
        requester: &Officer,
        tappal: &Tappal,
        assignee: Option<&Officer>,
        ledger: &[Movement],
    ) -> AccessDecision {
        let grant = self.visibility(requester, tappal, assignee, ledger);

        let decision = match grant {
            AccessGrant::Denied => AccessDecision::denied(),
            AccessGrant::Oversight | AccessGrant::Administrative | AccessGrant::Assignee => {
                AccessDecision {
                    capabilities: Capabilities::full(),
                    grant,
                }
            }
            AccessGrant::ChainSuperior | AccessGrant::LedgerParticipant => {
                let capabilities = if self.hierarchy.has_routing_authority(requester.role) {
                    Capabilities::full()
                } else {
                    Capabilities::view_only()
                };
                AccessDecision { capabilities, grant }
            }
        };

        debug!(
            tappal_id = %tappal.id,
            officer_id = %requester.id,
            role = %requester.role.as_str(),
            grant = ?decision.grant,
            "Evaluated tappal access"
        );

        decision
    }

    fn visibility(
        &self,
        requester: &Officer,
        tappal: &Tappal,
        assignee: Option<&Officer>,
        ledger: &[Movement],
    ) -> AccessGrant {
        match self.hierarchy.tier(requester.role) {
            Tier::Oversight => return AccessGrant::Oversight,
            Tier::Administrative => return AccessGrant::Administrative,
            Tier::Operational => {}
        }

        if requester.id == tappal.assigned_to {
            return AccessGrant::Assignee;
        }

        if let Some(holder) = assignee.filter(|a| a.id == tappal.assigned_to) {
            if self.hierarchy.is_senior(requester.role, holder.role)
                && self.hierarchy.reaches(requester.role, holder.role)
            {
                return AccessGrant::ChainSuperior;
            }
        }

        if ledger
            .iter()
            .filter(|m| m.tappal_id == tappal.id)
            .any(|m| m.involves(&requester.id))
        {
            return AccessGrant::LedgerParticipant;
        }

        AccessGrant::Denied
    }
}
