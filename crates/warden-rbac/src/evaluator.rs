//! Access evaluation.
//!
//! Pure functions mapping (subject, requirement) to allow/deny. Nothing here
//! holds state or caches results: every call reads the role map as it is now.
//!
//! All checks fail closed. A missing subject, an unrecognized role, a role
//! missing from the map, an empty allowed-role set, or an invalid action
//! name all deny, and none of them is an error.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use warden_types::{Permission, Role, Subject};

use crate::permissions::RoleMap;
use crate::policy::Requirement;

// ============================================================================
// Decision
// ============================================================================

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    /// No subject is logged in. Callers usually send the user to login.
    Unauthenticated,

    /// A subject is logged in but lacks the required role or permission.
    Forbidden,
}

impl DenialReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenialReason::Unauthenticated => "UNAUTHENTICATED",
            DenialReason::Forbidden => "FORBIDDEN",
        }
    }
}

impl Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allowed,
    Denied(DenialReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Returns the denial reason, if denied.
    pub fn denial_reason(self) -> Option<DenialReason> {
        match self {
            Decision::Allowed => None,
            Decision::Denied(reason) => Some(reason),
        }
    }

    fn from_check(subject: Option<&Subject>, granted: bool) -> Self {
        match subject {
            None => Decision::Denied(DenialReason::Unauthenticated),
            Some(_) if granted => Decision::Allowed,
            Some(_) => Decision::Denied(DenialReason::Forbidden),
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allowed => f.write_str("ALLOWED"),
            Decision::Denied(reason) => write!(f, "DENIED/{reason}"),
        }
    }
}

// ============================================================================
// Role-based checks
// ============================================================================

/// Returns whether the subject's role is one of `allowed_roles`.
///
/// False for anonymous subjects, for an empty allowed set, and for
/// unrecognized roles (even if the set contains the same unrecognized name).
pub fn has_role(subject: Option<&Subject>, allowed_roles: &BTreeSet<Role>) -> bool {
    subject.is_some_and(|s| s.role.is_recognized() && allowed_roles.contains(&s.role))
}

// ============================================================================
// Permission-based checks
// ============================================================================

/// Returns whether the subject's role is granted `action` by `role_map`.
pub fn has_permission(role_map: &RoleMap, subject: Option<&Subject>, action: &Permission) -> bool {
    subject.is_some_and(|s| role_map.grants(&s.role, action))
}

/// String form of [`has_permission`] for a bare role.
///
/// Actions that are not valid permission names are denied.
///
/// # Examples
///
/// ```
/// use warden_rbac::{RoleMap, evaluator::can_access};
/// use warden_types::Role;
///
/// let map = RoleMap::standard();
/// assert!(can_access(&map, &Role::Admin, "delete_post"));
/// assert!(!can_access(&map, &Role::Viewer, "delete_post"));
/// assert!(!can_access(&map, &Role::parse("superadmin"), "view_dashboard"));
/// assert!(!can_access(&map, &Role::Admin, "Delete Post"));
/// ```
pub fn can_access(role_map: &RoleMap, role: &Role, action: &str) -> bool {
    role_map.permissions(role).contains_name(action)
}

// ============================================================================
// Combined evaluation
// ============================================================================

/// Evaluates a requirement against the subject.
///
/// # Postcondition
///
/// Always returns a `Decision`. `Unauthenticated` if and only if there is no
/// subject.
pub fn evaluate(role_map: &RoleMap, subject: Option<&Subject>, requirement: &Requirement) -> Decision {
    match requirement {
        Requirement::AnyRole(roles) => evaluate_roles(subject, roles),
        Requirement::Permission(action) => {
            Decision::from_check(subject, has_permission(role_map, subject, action))
        }
    }
}

/// Evaluates a role requirement. Role checks never consult a role map.
pub fn evaluate_roles(subject: Option<&Subject>, allowed_roles: &BTreeSet<Role>) -> Decision {
    Decision::from_check(subject, has_role(subject, allowed_roles))
}

/// Returns a human-readable explanation of the decision for `requirement`.
pub fn explain(role_map: &RoleMap, subject: Option<&Subject>, requirement: &Requirement) -> String {
    let decision = evaluate(role_map, subject, requirement);
    let Some(subject) = subject else {
        return format!("{decision}: no subject is logged in");
    };

    match requirement {
        _ if !subject.role.is_recognized() => {
            format!("{decision}: role '{}' is not recognized", subject.role)
        }
        Requirement::AnyRole(roles) if roles.is_empty() => {
            format!("{decision}: no roles are allowed")
        }
        Requirement::AnyRole(_) if decision.is_allowed() => {
            format!("{decision}: role '{}' satisfies {requirement}", subject.role)
        }
        Requirement::AnyRole(_) => {
            format!("{decision}: role '{}' does not satisfy {requirement}", subject.role)
        }
        Requirement::Permission(_) if !role_map.contains_role(&subject.role) => {
            format!("{decision}: role '{}' has no entry in the role map", subject.role)
        }
        Requirement::Permission(action) if decision.is_allowed() => {
            format!("{decision}: role '{}' is granted {action}", subject.role)
        }
        Requirement::Permission(action) => {
            format!("{decision}: role '{}' is not granted {action}", subject.role)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn perm(name: &str) -> Permission {
        Permission::parse(name).unwrap()
    }

    fn subject(role: &str) -> Subject {
        Subject::new("TestUser", role)
    }

    fn roles(names: &[&str]) -> BTreeSet<Role> {
        names.iter().map(|n| Role::parse(n)).collect()
    }

    #[test_case("editor", "delete_post", Decision::Denied(DenialReason::Forbidden); "editor cannot delete")]
    #[test_case("editor", "view_dashboard", Decision::Allowed; "editor can view")]
    #[test_case("admin", "delete_post", Decision::Allowed; "admin can delete")]
    #[test_case("viewer", "edit_user", Decision::Denied(DenialReason::Forbidden); "viewer cannot edit")]
    #[test_case("superadmin", "view_dashboard", Decision::Denied(DenialReason::Forbidden); "unknown role fails closed")]
    fn test_permission_scenarios(role: &str, action: &str, expected: Decision) {
        let map = RoleMap::standard();
        let s = subject(role);
        let requirement = Requirement::permission(perm(action));

        assert_eq!(evaluate(&map, Some(&s), &requirement), expected);
    }

    #[test]
    fn test_anonymous_is_unauthenticated() {
        let map = RoleMap::standard();
        let requirement = Requirement::any_role([Role::Admin]);

        assert_eq!(
            evaluate(&map, None, &requirement),
            Decision::Denied(DenialReason::Unauthenticated)
        );
        // Regardless of the map contents.
        assert_eq!(
            evaluate(&RoleMap::new(), None, &requirement),
            Decision::Denied(DenialReason::Unauthenticated)
        );
    }

    #[test]
    fn test_has_role() {
        let admin = subject("admin");
        let editor = subject("editor");
        let allowed = roles(&["admin", "editor"]);

        assert!(has_role(Some(&admin), &allowed));
        assert!(has_role(Some(&editor), &allowed));
        assert!(!has_role(Some(&subject("viewer")), &allowed));
        assert!(!has_role(None, &allowed));
    }

    #[test]
    fn test_empty_allowed_roles_denies() {
        let admin = subject("admin");
        assert!(!has_role(Some(&admin), &BTreeSet::new()));
        assert_eq!(
            evaluate_roles(Some(&admin), &BTreeSet::new()),
            Decision::Denied(DenialReason::Forbidden)
        );
    }

    #[test]
    fn test_unrecognized_role_never_matches_itself() {
        let s = subject("superadmin");
        let allowed = roles(&["superadmin", "admin"]);
        assert!(!has_role(Some(&s), &allowed));
    }

    #[test]
    fn test_grant_then_revoke_flips_answer() {
        let mut map = RoleMap::standard();
        let editor = subject("editor");
        let delete = perm("delete_post");

        assert!(!has_permission(&map, Some(&editor), &delete));

        map.grant(&Role::Editor, delete.clone());
        assert!(has_permission(&map, Some(&editor), &delete));

        map.revoke(&Role::Editor, &delete);
        assert!(!has_permission(&map, Some(&editor), &delete));
    }

    #[test]
    fn test_can_access_invalid_action() {
        let map = RoleMap::standard();
        assert!(!can_access(&map, &Role::Admin, ""));
        assert!(!can_access(&map, &Role::Admin, "VIEW_DASHBOARD"));
    }

    #[test]
    fn test_explain() {
        let map = RoleMap::from_table([("admin", vec!["delete_post"])]).unwrap();
        let delete = Requirement::permission(perm("delete_post"));

        let text = explain(&map, None, &delete);
        assert_eq!(text, "DENIED/UNAUTHENTICATED: no subject is logged in");

        let text = explain(&map, Some(&subject("admin")), &delete);
        assert_eq!(text, "ALLOWED: role 'admin' is granted delete_post");

        let text = explain(&map, Some(&subject("viewer")), &delete);
        assert!(text.contains("has no entry in the role map"));

        let text = explain(&map, Some(&subject("root")), &delete);
        assert!(text.contains("'root' is not recognized"));

        let text = explain(&map, Some(&subject("viewer")), &Requirement::any_role([]));
        assert_eq!(text, "DENIED/FORBIDDEN: no roles are allowed");
    }

    #[test]
    fn test_decision_serde() {
        let json = serde_json::to_string(&Decision::Denied(DenialReason::Forbidden)).unwrap();
        assert_eq!(json, r#"{"decision":"DENIED","reason":"FORBIDDEN"}"#);

        let json = serde_json::to_string(&Decision::Allowed).unwrap();
        assert_eq!(json, r#"{"decision":"ALLOWED"}"#);
    }

    fn any_action() -> impl Strategy<Value = Permission> {
        "[a-z][a-z0-9_]{0,20}".prop_map(|s| Permission::parse(s).unwrap())
    }

    fn any_known_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::KNOWN.to_vec())
    }

    proptest! {
        #[test]
        fn unknown_role_never_has_permission(
            name in "[a-z]{1,12}",
            action in any_action(),
        ) {
            let role = Role::parse(&name);
            prop_assume!(!role.is_recognized());

            let map = RoleMap::standard();
            let s = Subject::new("u", role);
            prop_assert!(!has_permission(&map, Some(&s), &action));
            prop_assert_eq!(
                evaluate(&map, Some(&s), &Requirement::permission(action)),
                Decision::Denied(DenialReason::Forbidden)
            );
        }

        #[test]
        fn anonymous_never_allowed(
            allowed in prop::collection::btree_set(any_known_role(), 1..3),
            action in any_action(),
        ) {
            let map = RoleMap::standard();
            prop_assert!(!has_role(None, &allowed));
            prop_assert!(!has_permission(&map, None, &action));
        }

        #[test]
        fn mapped_action_is_granted(role in any_known_role(), action in any_action()) {
            let mut map = RoleMap::new();
            map.grant(&role, action.clone());

            let s = Subject::new("u", role);
            prop_assert!(has_permission(&map, Some(&s), &action));
        }
    }
}
