//! Kani bounded model checking proofs for gate correctness.
//!
//! - Proof #1: Anonymous subjects are always unauthenticated
//! - Proof #2: Unrecognized roles are always forbidden
//! - Proof #3: Empty allowed-role sets never allow

use std::collections::BTreeSet;

use crate::{
    evaluator::{self, Decision, DenialReason},
    permissions::RoleMap,
    policy::Requirement,
};
use warden_types::{Permission, Role, Subject};

fn any_known_role() -> Role {
    match kani::any::<u8>() % 3 {
        0 => Role::Admin,
        1 => Role::Editor,
        _ => Role::Viewer,
    }
}

//=============================================================================
// Proof #1: Anonymous Denial
//=============================================================================

/// Verifies that evaluation without a subject is `Unauthenticated` for any
/// role requirement, whatever the role map contains.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(5)]
fn verify_anonymous_unauthenticated() {
    let mut roles = BTreeSet::new();
    roles.insert(any_known_role());

    let decision = evaluator::evaluate(&RoleMap::standard(), None, &Requirement::AnyRole(roles));
    assert_eq!(decision, Decision::Denied(DenialReason::Unauthenticated));
}

//=============================================================================
// Proof #2: Fail Closed on Unknown Roles
//=============================================================================

/// Verifies that an unrecognized role is forbidden every permission, even if
/// the caller tries to grant it one.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(5)]
fn verify_unrecognized_role_forbidden() {
    let role = Role::parse("superadmin");
    let Ok(action) = Permission::parse("view_dashboard") else {
        return;
    };

    let mut map = RoleMap::standard();
    assert!(!map.grant(&role, action.clone()));

    let subject = Subject::new("root", role);
    let decision = evaluator::evaluate(&map, Some(&subject), &Requirement::Permission(action));
    assert_eq!(decision, Decision::Denied(DenialReason::Forbidden));
}

//=============================================================================
// Proof #3: Empty Role Set
//=============================================================================

/// Verifies that no authenticated subject passes an empty role requirement.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(5)]
fn verify_empty_role_set_denies() {
    let subject = Subject::new("user", any_known_role());
    assert!(!evaluator::has_role(Some(&subject), &BTreeSet::new()));
}
