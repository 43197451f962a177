//! Capability requirements attached to protected regions.
//!
//! A requirement is declared at the call site (on a [`Gate`](crate::Gate) or
//! a route), never stored centrally.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use warden_types::{Permission, Role};

/// What a protected region needs from the current subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// The subject's role must be one of these.
    ///
    /// An empty set matches nobody.
    AnyRole(BTreeSet<Role>),

    /// The subject's role must be granted this permission by the role map.
    Permission(Permission),
}

impl Requirement {
    /// Requires one of the given roles.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_rbac::Requirement;
    /// use warden_types::Role;
    ///
    /// let editors = Requirement::any_role([Role::Admin, Role::Editor]);
    /// assert!(editors.allowed_roles().unwrap().contains(&Role::Editor));
    /// ```
    pub fn any_role(roles: impl IntoIterator<Item = Role>) -> Self {
        Requirement::AnyRole(roles.into_iter().collect())
    }

    /// Requires a single permission.
    pub fn permission(permission: Permission) -> Self {
        Requirement::Permission(permission)
    }

    /// Returns the allowed roles for a role requirement.
    pub fn allowed_roles(&self) -> Option<&BTreeSet<Role>> {
        match self {
            Requirement::AnyRole(roles) => Some(roles),
            Requirement::Permission(_) => None,
        }
    }

    /// Returns the required permission for a permission requirement.
    pub fn required_permission(&self) -> Option<&Permission> {
        match self {
            Requirement::AnyRole(_) => None,
            Requirement::Permission(p) => Some(p),
        }
    }

    /// Returns whether evaluating this requirement needs a role map.
    pub fn needs_role_map(&self) -> bool {
        matches!(self, Requirement::Permission(_))
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::AnyRole(roles) if roles.is_empty() => f.write_str("role in {}"),
            Requirement::AnyRole(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                write!(f, "role in {{{}}}", names.join(", "))
            }
            Requirement::Permission(p) => write!(f, "permission {p}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_accessors() {
        let roles = Requirement::any_role([Role::Admin]);
        assert!(roles.allowed_roles().is_some());
        assert!(roles.required_permission().is_none());
        assert!(!roles.needs_role_map());

        let perm = Requirement::permission(Permission::parse("edit_user").unwrap());
        assert!(perm.allowed_roles().is_none());
        assert_eq!(perm.required_permission().unwrap().as_str(), "edit_user");
        assert!(perm.needs_role_map());
    }

    #[test]
    fn test_requirement_display() {
        let roles = Requirement::any_role([Role::Editor, Role::Admin]);
        assert_eq!(roles.to_string(), "role in {admin, editor}");

        assert_eq!(Requirement::any_role([]).to_string(), "role in {}");

        let perm = Requirement::permission(Permission::parse("delete_post").unwrap());
        assert_eq!(perm.to_string(), "permission delete_post");
    }
}
