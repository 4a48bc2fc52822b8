//! Core types for tappal routing.
//!
//! These types model officers, the tappals they route, and the custody
//! records left behind as a tappal moves down and across the hierarchy.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for consistency with the web frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Officer role tag.
///
/// Nine operational tiers from Collector down to Clerk, plus the
/// Co-Officer oversight tier that sits beside the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Oversight track, outside the operational chain
    CoOfficer,
    /// District Collector - top administrative role
    Collector,
    /// Joint Collector
    JointCollector,
    /// District Revenue Officer
    Dro,
    /// Revenue Divisional Officer
    Rdo,
    Tahsildar,
    NaibTahsildar,
    /// Revenue Inspector
    Ri,
    /// Village Revenue Officer
    Vro,
    Clerk,
}

impl Role {
    /// Get the wire tag used in fixtures and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoOfficer => "co_officer",
            Self::Collector => "collector",
            Self::JointCollector => "joint_collector",
            Self::Dro => "dro",
            Self::Rdo => "rdo",
            Self::Tahsildar => "tahsildar",
            Self::NaibTahsildar => "naib_tahsildar",
            Self::Ri => "ri",
            Self::Vro => "vro",
            Self::Clerk => "clerk",
        }
    }

    /// Human-readable title.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CoOfficer => "Co-Officer",
            Self::Collector => "Collector",
            Self::JointCollector => "Joint Collector",
            Self::Dro => "DRO",
            Self::Rdo => "RDO",
            Self::Tahsildar => "Tahsildar",
            Self::NaibTahsildar => "Naib Tahsildar",
            Self::Ri => "RI",
            Self::Vro => "VRO",
            Self::Clerk => "Clerk",
        }
    }

    /// All roles, oversight first, then the chain from the top down.
    pub fn all() -> Vec<Self> {
        vec![
            Self::CoOfficer,
            Self::Collector,
            Self::JointCollector,
            Self::Dro,
            Self::Rdo,
            Self::Tahsildar,
            Self::NaibTahsildar,
            Self::Ri,
            Self::Vro,
            Self::Clerk,
        ]
    }

    /// Parse a wire tag.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::all().into_iter().find(|r| r.as_str() == tag)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An officer as resolved from the officer directory.
///
/// The core never creates or mutates officers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Officer {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Role tag held by this officer
    pub role: Role,
    /// Department the officer belongs to
    pub department: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
}

impl Officer {
    /// Create an officer with no contact details.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        department: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            department: department.into(),
            phone: None,
            email: None,
        }
    }

    /// Capture identity and role as they are right now.
    pub fn snapshot(&self) -> OfficerSnapshot {
        OfficerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Identity and role of an officer frozen at the time of a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct OfficerSnapshot {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// Tappal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum TappalStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Under Review")]
    UnderReview,
    /// Terminal success state; the only state that carries `completed_at`
    Completed,
    Rejected,
}

impl TappalStatus {
    /// Get the display string, identical to the wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::UnderReview => "Under Review",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }

    /// Completed or Rejected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::InProgress,
            Self::UnderReview,
            Self::Completed,
            Self::Rejected,
        ]
    }

    /// Parse either the display string or a snake_case spelling.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        Self::all()
            .into_iter()
            .find(|s| s.as_str().to_ascii_lowercase() == normalized)
    }
}

impl Default for TappalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for TappalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tappal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
    Urgent = 3,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// A unit of routed correspondence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Tappal {
    /// Unique identifier
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub department: String,
    /// Confidential correspondence flag
    #[serde(default)]
    pub confidential: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TappalStatus,
    pub created_at: DateTime<Utc>,
    /// Response deadline
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Set if and only if status is Completed
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Officer currently holding the tappal
    pub assigned_to: String,
    /// Optimistic concurrency stamp, bumped on every committed change
    #[serde(default)]
    pub version: u64,
}

impl Tappal {
    /// Create a pending tappal held by `assigned_to`.
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        department: impl Into<String>,
        assigned_to: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            description: String::new(),
            department: department.into(),
            confidential: false,
            priority: Priority::default(),
            status: TappalStatus::Pending,
            created_at: Utc::now(),
            expires_at: None,
            completed_at: None,
            assigned_to: assigned_to.into(),
            version: 0,
        }
    }

    /// Builder: set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: set expiry.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Builder: mark confidential.
    pub fn confidential(mut self) -> Self {
        self.confidential = true;
        self
    }

    /// Check whether the deadline has passed without completion.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(deadline) => now > deadline && self.status != TappalStatus::Completed,
            None => false,
        }
    }

    /// Check the `completed_at` invariant.
    pub fn completion_consistent(&self) -> bool {
        self.completed_at.is_some() == (self.status == TappalStatus::Completed)
    }
}

/// Custody status recorded on a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Forwarded,
    Received,
    Processed,
}

impl MovementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forwarded => "forwarded",
            Self::Received => "received",
            Self::Processed => "processed",
        }
    }
}

/// One recorded custody transfer.
///
/// Movements are appended once and never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Movement {
    /// Unique identifier
    pub id: String,
    /// Tappal this movement belongs to
    pub tappal_id: String,
    /// Ledger-wide insertion counter, breaks timestamp ties
    #[serde(default)]
    pub sequence: u64,
    pub from: OfficerSnapshot,
    pub to: OfficerSnapshot,
    pub reason: String,
    pub status: MovementStatus,
    pub timestamp: DateTime<Utc>,
    /// SHA256 over this entry chained to the previous entry's digest
    #[serde(default)]
    pub digest: String,
}

impl Movement {
    /// Check whether an officer took part in this movement.
    pub fn involves(&self, officer_id: &str) -> bool {
        self.from.id == officer_id || self.to.id == officer_id
    }
}

/// A remark attached to a tappal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Comment {
    pub id: String,
    pub tappal_id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a comment authored by `author` now.
    pub fn new(tappal_id: impl Into<String>, author: &Officer, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tappal_id: tappal_id.into(),
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// What an officer may do with a tappal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Capabilities {
    pub can_view: bool,
    pub can_forward: bool,
    pub can_change_status: bool,
}

impl Capabilities {
    /// No access at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// View, forward and change status.
    pub fn full() -> Self {
        Self {
            can_view: true,
            can_forward: true,
            can_change_status: true,
        }
    }

    /// View only.
    pub fn view_only() -> Self {
        Self {
            can_view: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::NaibTahsildar).unwrap();
        assert_eq!(json, "\"naib_tahsildar\"");

        let parsed: Role = serde_json::from_str("\"co_officer\"").unwrap();
        assert_eq!(parsed, Role::CoOfficer);
        assert_eq!(Role::parse("joint_collector"), Some(Role::JointCollector));
        assert_eq!(Role::parse("governor"), None);
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&TappalStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");

        assert_eq!(TappalStatus::parse("under_review"), Some(TappalStatus::UnderReview));
        assert_eq!(TappalStatus::parse("Completed"), Some(TappalStatus::Completed));
        assert_eq!(TappalStatus::parse("archived"), None);
    }

    #[test]
    fn test_tappal_expiry() {
        let now = Utc::now();
        let tappal = Tappal::new("T1", "Land record", "Revenue", "O1")
            .with_expiry(now - chrono::Duration::days(1));
        assert!(tappal.is_expired(now));

        let mut done = tappal.clone();
        done.status = TappalStatus::Completed;
        done.completed_at = Some(now);
        assert!(!done.is_expired(now));
        assert!(done.completion_consistent());
        assert!(tappal.completion_consistent());
    }

    #[test]
    fn test_movement_involves() {
        let from = Officer::new("O1", "Ravi", Role::Tahsildar, "Revenue");
        let to = Officer::new("O4", "Lakshmi", Role::NaibTahsildar, "Revenue");
        let movement = Movement {
            id: "m1".to_string(),
            tappal_id: "T1".to_string(),
            sequence: 0,
            from: from.snapshot(),
            to: to.snapshot(),
            reason: "field verification".to_string(),
            status: MovementStatus::Forwarded,
            timestamp: Utc::now(),
            digest: String::new(),
        };
        assert!(movement.involves("O1"));
        assert!(movement.involves("O4"));
        assert!(!movement.involves("O9"));
    }
}
