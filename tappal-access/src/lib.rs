//! Tappal Access Control for district correspondence routing
//!
//! This crate holds the rules that decide who may touch a tappal as it
//! moves through the revenue hierarchy:
//!
//! - **Collector / Joint Collector**: top administrative roles, see everything
//! - **DRO, RDO, Tahsildar, Naib Tahsildar, RI, VRO, Clerk**: operational chain
//! - **Co-Officer**: parallel oversight track, sees everything
//!
//! # Key Components
//!
//! - [`RoleHierarchy`]: Declarative rank and subordinate table
//! - [`AccessEvaluator`]: Computes view / forward / change-status capabilities
//! - [`lifecycle`]: Status state machine rules
//!
//! # Example
//!
//! ```
//! use tappal_access::{AccessEvaluator, Officer, Role, Tappal};
//!
//! let tahsildar = Officer::new("O1", "Ravi", Role::Tahsildar, "Revenue");
//! let rdo = Officer::new("O2", "Meena", Role::Rdo, "Revenue");
//! let tappal = Tappal::new("T1", "Land survey dispute", "Revenue", "O1");
//!
//! let decision = AccessEvaluator::new().evaluate(&rdo, &tappal, Some(&tahsildar), &[]);
//! assert!(decision.capabilities.can_view);
//! ```

pub mod evaluator;
pub mod hierarchy;
pub mod lifecycle;
pub mod types;

// Re-export main types
pub use evaluator::{AccessDecision, AccessEvaluator, AccessGrant};
pub use hierarchy::{RoleEntry, RoleHierarchy, Tier};
pub use lifecycle::{TransitionError, TransitionPolicy};
pub use types::*;
