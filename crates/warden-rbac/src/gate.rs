//! The gate: decides whether protected content may be produced.
//!
//! A gate reads the injected [`IdentityStore`] on every evaluation and never
//! caches the subject. Denials carry a reason and a redirect target so the
//! caller can choose between a login prompt and a "not permitted" view; the
//! gate itself never navigates.
//!
//! This is a presentation gate. It hides UI from subjects who should not see
//! it, but it is not a security boundary: anything it protects must be
//! authorized again by the server.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{info, warn};
use warden_types::{Permission, Role, TypeError};

use crate::evaluator::{self, Decision, DenialReason};
use crate::identity::IdentityStore;
use crate::permissions::RoleMap;
use crate::policy::Requirement;
use crate::routes::Redirects;

/// Error type for gate construction.
///
/// Every variant is a programmer error and is reported by
/// [`GateBuilder::build`], never during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// No identity store was bound to the gate.
    #[error("gate has no identity store bound")]
    MissingIdentityStore,

    /// Neither roles nor a permission were required.
    #[error("gate declares no requirement")]
    MissingRequirement,

    /// Both roles and a permission were required.
    #[error("gate declares both a role and a permission requirement")]
    ConflictingRequirement,

    /// A permission requirement was declared without a role map.
    #[error("permission requirement {0} needs a role map")]
    MissingRoleMap(Permission),

    /// The required permission name is not valid.
    #[error(transparent)]
    InvalidPermission(#[from] TypeError),
}

/// Result type for gate construction.
pub type Result<T> = std::result::Result<T, GateError>;

/// Evaluation state of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    /// The gate has not been evaluated yet.
    #[default]
    Unevaluated,

    /// The last evaluation allowed access.
    Allowed,

    /// The last evaluation denied access.
    Denied(DenialReason),
}

impl GateState {
    pub fn is_allowed(self) -> bool {
        matches!(self, GateState::Allowed)
    }
}

impl From<Decision> for GateState {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Allowed => GateState::Allowed,
            Decision::Denied(reason) => GateState::Denied(reason),
        }
    }
}

/// A denied evaluation, with where the caller may want to send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,

    /// Login path for `Unauthenticated`, unauthorized path for `Forbidden`.
    pub redirect: String,
}

/// Result of [`Gate::guard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<T> {
    /// Access allowed; the protected content was produced.
    Granted(T),

    /// Access denied; the protected content was never produced.
    Denied(Denial),
}

impl<T> Access<T> {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted(_))
    }

    /// Converts into a `Result`, treating denial as the error side.
    pub fn into_result(self) -> std::result::Result<T, Denial> {
        match self {
            Access::Granted(content) => Ok(content),
            Access::Denied(denial) => Err(denial),
        }
    }
}

/// Boundary that allows or denies protected content.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use warden_rbac::{Access, Gate, GateState, IdentityStore, RoleMap};
/// use warden_rbac::evaluator::DenialReason;
/// use warden_types::{Role, Subject};
///
/// let store = IdentityStore::shared();
/// let gate = Gate::builder()
///     .identity(Arc::clone(&store))
///     .role_map(Arc::new(RoleMap::standard()))
///     .require_action("delete_post")
///     .without_audit()
///     .build()?;
///
/// assert_eq!(gate.evaluate(), GateState::Denied(DenialReason::Unauthenticated));
///
/// store.login(Subject::new("TestUser", Role::Admin));
/// assert!(matches!(gate.guard(|| "delete button"), Access::Granted("delete button")));
/// # Ok::<(), warden_rbac::GateError>(())
/// ```
#[derive(Debug)]
pub struct Gate {
    identity: Arc<IdentityStore>,
    role_map: Arc<RoleMap>,
    requirement: Requirement,
    redirects: Redirects,
    label: Option<String>,
    audit_enabled: bool,
    state: Mutex<GateState>,
}

impl Gate {
    /// Starts building a gate.
    pub fn builder() -> GateBuilder {
        GateBuilder::default()
    }

    /// Evaluates the requirement against the current subject.
    ///
    /// Never returns [`GateState::Unevaluated`].
    pub fn evaluate(&self) -> GateState {
        let identity = self.identity.current_subject();
        let subject = identity.subject();
        let decision = evaluator::evaluate(&self.role_map, subject, &self.requirement);

        if self.audit_enabled {
            let username = subject.map_or("<anonymous>", |s| s.username.as_str());
            let label = self.label.as_deref().unwrap_or("");
            match decision {
                Decision::Allowed => info!(
                    gate = %label,
                    username = %username,
                    requirement = %self.requirement,
                    "Gate access granted"
                ),
                Decision::Denied(reason) => warn!(
                    gate = %label,
                    username = %username,
                    requirement = %self.requirement,
                    reason = %reason,
                    "Gate access denied"
                ),
            }
        }

        let state = GateState::from(decision);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        state
    }

    /// Produces `content` only if the gate allows access.
    pub fn guard<T>(&self, content: impl FnOnce() -> T) -> Access<T> {
        match self.evaluate() {
            GateState::Allowed => Access::Granted(content()),
            GateState::Denied(reason) => Access::Denied(self.denial(reason)),
            // evaluate() always lands in Allowed or Denied.
            GateState::Unevaluated => Access::Denied(self.denial(DenialReason::Unauthenticated)),
        }
    }

    /// Returns the outcome of the most recent evaluation.
    pub fn state(&self) -> GateState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds the denial for `reason` using the configured redirects.
    pub fn denial(&self, reason: DenialReason) -> Denial {
        Denial {
            reason,
            redirect: self.redirects.target(reason).to_string(),
        }
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Builder for [`Gate`]. Validation happens in [`GateBuilder::build`].
#[derive(Debug)]
pub struct GateBuilder {
    identity: Option<Arc<IdentityStore>>,
    role_map: Option<Arc<RoleMap>>,
    roles: Option<BTreeSet<Role>>,
    permission: Option<std::result::Result<Permission, TypeError>>,
    redirects: Redirects,
    label: Option<String>,
    audit_enabled: bool,
}

impl Default for GateBuilder {
    fn default() -> Self {
        Self {
            identity: None,
            role_map: None,
            roles: None,
            permission: None,
            redirects: Redirects::default(),
            label: None,
            audit_enabled: true,
        }
    }
}

impl GateBuilder {
    /// Binds the identity store the gate reads on every evaluation.
    pub fn identity(mut self, store: Arc<IdentityStore>) -> Self {
        self.identity = Some(store);
        self
    }

    /// Binds the role map used for permission requirements.
    pub fn role_map(mut self, role_map: Arc<RoleMap>) -> Self {
        self.role_map = Some(role_map);
        self
    }

    /// Requires the subject to hold one of `roles`.
    pub fn require_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles
            .get_or_insert_with(BTreeSet::new)
            .extend(roles);
        self
    }

    /// Requires the subject's role to be granted `permission`.
    pub fn require_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(Ok(permission));
        self
    }

    /// Requires a permission by name. An invalid name fails the build.
    pub fn require_action(mut self, action: &str) -> Self {
        self.permission = Some(Permission::parse(action));
        self
    }

    /// Applies a prebuilt requirement.
    pub fn require(self, requirement: Requirement) -> Self {
        match requirement {
            Requirement::AnyRole(roles) => self.require_roles(roles),
            Requirement::Permission(p) => self.require_permission(p),
        }
    }

    /// Overrides the redirect targets reported on denial.
    pub fn redirects(mut self, redirects: Redirects) -> Self {
        self.redirects = redirects;
        self
    }

    /// Names the gate in audit logs.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// Validates the configuration and builds the gate.
    ///
    /// # Errors
    ///
    /// See [`GateError`]. Role-only gates do not need a role map.
    pub fn build(self) -> Result<Gate> {
        let identity = self.identity.ok_or(GateError::MissingIdentityStore)?;

        let requirement = match (self.roles, self.permission) {
            (Some(_), Some(_)) => return Err(GateError::ConflictingRequirement),
            (None, None) => return Err(GateError::MissingRequirement),
            (Some(roles), None) => Requirement::AnyRole(roles),
            (None, Some(permission)) => Requirement::Permission(permission?),
        };

        let role_map = match (self.role_map, &requirement) {
            (Some(map), _) => map,
            (None, Requirement::Permission(p)) => {
                return Err(GateError::MissingRoleMap(p.clone()));
            }
            (None, Requirement::AnyRole(_)) => Arc::new(RoleMap::new()),
        };

        Ok(Gate {
            identity,
            role_map,
            requirement,
            redirects: self.redirects,
            label: self.label,
            audit_enabled: self.audit_enabled,
            state: Mutex::new(GateState::Unevaluated),
        })
    }
}
