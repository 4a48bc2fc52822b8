//! Role hierarchy table.
//!
//! The single declarative source of seniority and subordination between
//! roles. Every access decision asks this table; nothing else encodes
//! "role X outranks role Y".

use std::collections::{HashSet, VecDeque};

use crate::types::Role;

/// One row of the hierarchy table.
#[derive(Debug, Clone, Copy)]
pub struct RoleEntry {
    /// Role this row describes
    pub role: Role,
    /// Seniority, lower is more senior
    pub rank: u8,
    /// Direct subordinates
    pub subordinates: &'static [Role],
    pub tier: Tier,
}

/// Where a role sits relative to the operational chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Parallel oversight track, universally senior
    Oversight,
    /// Top of the chain, universally senior
    Administrative,
    /// Subject to the chain check
    Operational,
}

const CO_OFFICER: RoleEntry = RoleEntry {
    role: Role::CoOfficer,
    rank: 0,
    subordinates: &[],
    tier: Tier::Oversight,
};

const COLLECTOR: RoleEntry = RoleEntry {
    role: Role::Collector,
    rank: 1,
    subordinates: &[Role::JointCollector],
    tier: Tier::Administrative,
};

const JOINT_COLLECTOR: RoleEntry = RoleEntry {
    role: Role::JointCollector,
    rank: 2,
    subordinates: &[Role::Dro],
    tier: Tier::Administrative,
};

const DRO: RoleEntry = RoleEntry {
    role: Role::Dro,
    rank: 3,
    subordinates: &[Role::Rdo],
    tier: Tier::Operational,
};

const RDO: RoleEntry = RoleEntry {
    role: Role::Rdo,
    rank: 4,
    subordinates: &[Role::Tahsildar],
    tier: Tier::Operational,
};

const TAHSILDAR: RoleEntry = RoleEntry {
    role: Role::Tahsildar,
    rank: 5,
    subordinates: &[Role::NaibTahsildar],
    tier: Tier::Operational,
};

const NAIB_TAHSILDAR: RoleEntry = RoleEntry {
    role: Role::NaibTahsildar,
    rank: 6,
    subordinates: &[Role::Ri],
    tier: Tier::Operational,
};

const RI: RoleEntry = RoleEntry {
    role: Role::Ri,
    rank: 7,
    subordinates: &[Role::Vro],
    tier: Tier::Operational,
};

const VRO: RoleEntry = RoleEntry {
    role: Role::Vro,
    rank: 8,
    subordinates: &[Role::Clerk],
    tier: Tier::Operational,
};

const CLERK: RoleEntry = RoleEntry {
    role: Role::Clerk,
    rank: 9,
    subordinates: &[],
    tier: Tier::Operational,
};

const STANDARD_TABLE: &[RoleEntry] = &[
    CO_OFFICER,
    COLLECTOR,
    JOINT_COLLECTOR,
    DRO,
    RDO,
    TAHSILDAR,
    NAIB_TAHSILDAR,
    RI,
    VRO,
    CLERK,
];

/// Rank at or above which an officer may forward and change status
/// on tappals they can see.
pub const ROUTING_AUTHORITY_FLOOR: Role = Role::Ri;

/// The role that never receives routed work.
pub const TOP_ADMINISTRATIVE_ROLE: Role = Role::Collector;

/// Read-only view over the hierarchy table.
#[derive(Debug, Clone, Copy)]
pub struct RoleHierarchy {
    entries: &'static [RoleEntry],
}

impl RoleHierarchy {
    /// The district revenue hierarchy.
    pub const fn standard() -> Self {
        Self {
            entries: STANDARD_TABLE,
        }
    }

    fn entry(&self, role: Role) -> RoleEntry {
        match role {
            Role::CoOfficer => CO_OFFICER,
            Role::Collector => COLLECTOR,
            Role::JointCollector => JOINT_COLLECTOR,
            Role::Dro => DRO,
            Role::Rdo => RDO,
            Role::Tahsildar => TAHSILDAR,
            Role::NaibTahsildar => NAIB_TAHSILDAR,
            Role::Ri => RI,
            Role::Vro => VRO,
            Role::Clerk => CLERK,
        }
    }

    /// Every row, most senior first.
    pub fn entries(&self) -> &'static [RoleEntry] {
        self.entries
    }

    /// Seniority of a role; lower numbers are more senior.
    pub fn rank(&self, role: Role) -> u8 {
        self.entry(role).rank
    }

    /// Direct subordinates of a role.
    pub fn subordinates_of(&self, role: Role) -> &'static [Role] {
        self.entry(role).subordinates
    }

    /// All direct and transitive subordinates of a role.
    pub fn descendants_of(&self, role: Role) -> HashSet<Role> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<Role> = self.subordinates_of(role).iter().copied().collect();

        while let Some(next) = queue.pop_front() {
            if seen.insert(next) {
                queue.extend(self.subordinates_of(next).iter().copied());
            }
        }

        seen
    }

    /// Check if `a` is strictly senior to `b`.
    pub fn is_senior(&self, a: Role, b: Role) -> bool {
        self.rank(a) < self.rank(b)
    }

    /// Check if `junior` is reachable from `senior` through subordinate links.
    pub fn reaches(&self, senior: Role, junior: Role) -> bool {
        self.descendants_of(senior).contains(&junior)
    }

    /// Oversight and top administrative roles skip the chain check.
    pub fn bypasses_chain(&self, role: Role) -> bool {
        self.entry(role).tier != Tier::Operational
    }

    /// Tier of a role.
    pub fn tier(&self, role: Role) -> Tier {
        self.entry(role).tier
    }

    /// Roles allowed to delete any comment.
    pub fn is_administrator(&self, role: Role) -> bool {
        self.bypasses_chain(role)
    }

    /// Check if a role holds routing authority by rank alone.
    pub fn has_routing_authority(&self, role: Role) -> bool {
        self.bypasses_chain(role) || self.rank(role) <= self.rank(ROUTING_AUTHORITY_FLOOR)
    }

    /// Whether tappals may be forwarded to officers of this role.
    pub fn receives_routed_work(&self, role: Role) -> bool {
        role != TOP_ADMINISTRATIVE_ROLE
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_a_row() {
        let hierarchy = RoleHierarchy::standard();
        for role in Role::all() {
            assert!(
                hierarchy.entries().iter().any(|e| e.role == role),
                "missing row for {}",
                role
            );
        }
        assert_eq!(hierarchy.entries().len(), Role::all().len());
    }

    #[test]
    fn test_each_role_maps_to_its_own_row() {
        let hierarchy = RoleHierarchy::standard();
        for role in Role::all() {
            let row = hierarchy.entry(role);
            assert_eq!(row.role, role);
            let listed = hierarchy.entries().iter().find(|e| e.role == role).unwrap();
            assert_eq!(row.rank, listed.rank);
            assert_eq!(hierarchy.tier(role), listed.tier);
        }
    }

    #[test]
    fn test_ranks_are_strictly_ordered() {
        let hierarchy = RoleHierarchy::standard();
        let ranks: Vec<u8> = hierarchy.entries().iter().map(|e| e.rank).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_subordinates_are_junior() {
        let hierarchy = RoleHierarchy::standard();
        for entry in hierarchy.entries() {
            for sub in entry.subordinates {
                assert!(hierarchy.is_senior(entry.role, *sub));
            }
        }
    }

    #[test]
    fn test_transitive_reach() {
        let hierarchy = RoleHierarchy::standard();
        assert!(hierarchy.reaches(Role::Rdo, Role::Tahsildar));
        assert!(hierarchy.reaches(Role::Rdo, Role::Clerk));
        assert!(hierarchy.reaches(Role::Collector, Role::Vro));
        assert!(!hierarchy.reaches(Role::Vro, Role::Tahsildar));
        assert!(!hierarchy.reaches(Role::Tahsildar, Role::Tahsildar));
        assert!(hierarchy.descendants_of(Role::Clerk).is_empty());
        assert_eq!(hierarchy.descendants_of(Role::Ri).len(), 2);
    }

    #[test]
    fn test_routing_authority() {
        let hierarchy = RoleHierarchy::standard();
        assert!(hierarchy.has_routing_authority(Role::CoOfficer));
        assert!(hierarchy.has_routing_authority(Role::Ri));
        assert!(!hierarchy.has_routing_authority(Role::Vro));
        assert!(!hierarchy.has_routing_authority(Role::Clerk));
        assert!(!hierarchy.receives_routed_work(Role::Collector));
        assert!(hierarchy.receives_routed_work(Role::JointCollector));
    }
}
