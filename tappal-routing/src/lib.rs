//! Tappal Routing - custody and status operations
//!
//! Provides the operational half of the tappal core:
//! - Append-only, hash-chained movement ledger
//! - Forwarding protocol with an atomic reassign-and-record commit
//! - Status transitions validated before any remote call
//! - Collaborator contracts for the tappal store, officer directory and
//!   comment store, with in-memory implementations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            RoutingService               │
//! │   (open / forward / transition / ...)   │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┼───────────────┐
//!      ▼           ▼               ▼
//! ┌──────────┐ ┌───────────┐ ┌────────────┐
//! │ Tappal   │ │ Officer   │ │ Comment    │
//! │ Store    │ │ Directory │ │ Store      │
//! │ (ledger) │ │           │ │            │
//! └──────────┘ └───────────┘ └────────────┘
//! ```
//!
//! Capability evaluation and status rules live in `tappal_access`.

pub mod comments;
pub mod config;
pub mod directory;
pub mod error;
pub mod fixture;
pub mod forwarding;
pub mod ledger;
pub mod service;
pub mod session;
pub mod store;

// Re-export main types for convenience
pub use comments::{CommentStore, InMemoryCommentStore};
pub use config::{ConfigError, RoutingConfig};
pub use directory::{InMemoryDirectory, OfficerDirectory};
pub use error::{Action, RemoteError, Result, RoutingError, StoreError};
pub use fixture::{Fixture, FixtureError, FixtureStores};
pub use forwarding::{ForwardError, ForwardOutcome};
pub use ledger::{LedgerError, MovementLedger, PathGap};
pub use service::{RoutingService, TappalDetail, TappalView, TransitionOutcome};
pub use session::Session;
pub use store::{InMemoryTappalStore, StatusChange, TappalStore};
