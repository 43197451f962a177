//! # warden-rbac: client-side access gate
//!
//! Combines role-based and permission-based checks into one primitive:
//! - **Identity store** holding the acting subject (or nobody)
//! - **Role map** (3 roles: Admin, Editor, Viewer) with fully enumerated permissions
//! - **Evaluator** mapping (subject, requirement) to allow/deny, failing closed
//! - **Gate** that produces protected content only when allowed
//! - **Route table** resolving paths to render / redirect outcomes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  UI action (login / logout)                  │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  IdentityStore                               │
//! │  ├─ Current subject snapshot                 │
//! │  └─ Synchronous observer notification        │
//! └─────────────────┬───────────────────────────┘
//!                   │ current_subject()
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Gate                                        │
//! │  ├─ Requirement (roles or permission)        │
//! │  └─ Evaluator + RoleMap                      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  ALLOWED  or  DENIED { reason, redirect }    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Roles
//!
//! | Role    | view_dashboard | edit_user | delete_post |
//! |---------|----------------|-----------|-------------|
//! | Viewer  | ✓              | ✗         | ✗           |
//! | Editor  | ✓              | ✓         | ✗           |
//! | Admin   | ✓              | ✓         | ✓           |
//!
//! Any other role name is [`Role::Unrecognized`] and is denied everything.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use warden_rbac::{Gate, GateState, IdentityStore, RoleMap};
//! use warden_rbac::evaluator::DenialReason;
//! use warden_types::{Role, Subject};
//!
//! let store = IdentityStore::shared();
//! let role_map = Arc::new(RoleMap::standard());
//!
//! let editor_page = Gate::builder()
//!     .identity(Arc::clone(&store))
//!     .require_roles([Role::Admin, Role::Editor])
//!     .build()?;
//! let delete_button = Gate::builder()
//!     .identity(Arc::clone(&store))
//!     .role_map(Arc::clone(&role_map))
//!     .require_action("delete_post")
//!     .build()?;
//!
//! store.login(Subject::new("TestUser", Role::Editor));
//! assert_eq!(editor_page.evaluate(), GateState::Allowed);
//! assert_eq!(delete_button.evaluate(), GateState::Denied(DenialReason::Forbidden));
//!
//! store.logout();
//! assert_eq!(editor_page.evaluate(), GateState::Denied(DenialReason::Unauthenticated));
//! # Ok::<(), warden_rbac::GateError>(())
//! ```
//!
//! ## Trust boundary
//!
//! The gate is a presentation convenience. It decides what the client shows,
//! not what the client may do: every protected operation must be authorized
//! again by the server.

pub mod evaluator;
pub mod gate;
pub mod identity;
pub mod permissions;
pub mod policy;
pub mod routes;

// Re-export commonly used types
pub use evaluator::{Decision, DenialReason};
pub use gate::{Access, Denial, Gate, GateBuilder, GateError, GateState};
pub use identity::{Identity, IdentityEvent, IdentityStore, SubscriptionId};
pub use permissions::{PermissionSet, PolicyError, RoleMap, RoleMapBuilder};
pub use policy::Requirement;
pub use routes::{Redirects, RouteAccess, RouteOutcome, RouteTable, normalize_path};
pub use warden_types::{Permission, Role, Subject, UnrecognizedRole};

// Kani proofs for bounded model checking
#[cfg(kani)]
mod kani_proofs;
