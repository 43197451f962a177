//! Permission sets and the role → permission map.
//!
//! The map is fully enumerated: a role is granted exactly the permissions
//! listed for it, with no wildcards and no inheritance between roles.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_types::{Permission, Role, TypeError};

/// Error raised when a role map table is malformed.
///
/// These are configuration mistakes and surface when the map is built,
/// never when a check is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The table names a role the gate does not know.
    #[error("unknown role {0:?} in role map")]
    UnknownRole(String),

    /// The same role appears twice (possibly with different spelling).
    #[error("role {0} defined more than once in role map")]
    DuplicateRole(Role),

    /// A permission name failed validation.
    #[error("role {role}: {source}")]
    InvalidPermission {
        role: Role,
        #[source]
        source: TypeError,
    },
}

/// Set of permissions granted to a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: BTreeSet<Permission>,
}

impl PermissionSet {
    /// Creates a new permission set.
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Creates an empty permission set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns whether this set contains the given permission.
    pub fn contains(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns whether this set contains a permission with the given name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    /// Adds a permission to the set. Returns `false` if it was already present.
    pub fn grant(&mut self, permission: Permission) -> bool {
        self.permissions.insert(permission)
    }

    /// Removes a permission from the set. Returns `false` if it was absent.
    pub fn revoke(&mut self, permission: &Permission) -> bool {
        self.permissions.remove(permission)
    }

    /// Returns all permissions in the set, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Permission>> for PermissionSet {
    fn from(permissions: Vec<Permission>) -> Self {
        Self::new(permissions)
    }
}

/// Static mapping from role to the permissions it confers.
///
/// Roles absent from the map have no permissions. [`Role::Unrecognized`]
/// can never be a key, so unknown roles always fail closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, Vec<String>>",
    try_from = "BTreeMap<String, Vec<String>>"
)]
pub struct RoleMap {
    roles: BTreeMap<Role, PermissionSet>,
}

impl RoleMap {
    /// Creates an empty map (every role has no permissions).
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a map.
    pub fn builder() -> RoleMapBuilder {
        RoleMapBuilder::default()
    }

    /// The reference map:
    ///
    /// | Role   | view_dashboard | edit_user | delete_post |
    /// |--------|----------------|-----------|-------------|
    /// | admin  | ✓              | ✓         | ✓           |
    /// | editor | ✓              | ✓         | ✗           |
    /// | viewer | ✓              | ✗         | ✗           |
    pub fn standard() -> Self {
        let table = [
            ("admin", &["view_dashboard", "edit_user", "delete_post"][..]),
            ("editor", &["view_dashboard", "edit_user"][..]),
            ("viewer", &["view_dashboard"][..]),
        ];
        // The literals above are valid by construction.
        Self::from_table(table).unwrap_or_default()
    }

    /// Builds a map from a table of role names to permission names.
    ///
    /// # Errors
    ///
    /// Fails on unknown role names, duplicate roles, or invalid permission
    /// names. A malformed table is a setup error and is never partially
    /// accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_rbac::RoleMap;
    /// use warden_types::Role;
    ///
    /// let map = RoleMap::from_table([("viewer", vec!["view_dashboard"])]).unwrap();
    /// assert!(map.permissions(&Role::Viewer).contains_name("view_dashboard"));
    ///
    /// assert!(RoleMap::from_table([("superadmin", vec!["anything"])]).is_err());
    /// ```
    pub fn from_table<R, I, P>(table: impl IntoIterator<Item = (R, I)>) -> Result<Self, PolicyError>
    where
        R: AsRef<str>,
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut builder = Self::builder();
        for (role_name, permissions) in table {
            let role = Role::parse(role_name.as_ref());
            if !role.is_recognized() {
                return Err(PolicyError::UnknownRole(role_name.as_ref().to_string()));
            }
            let mut set = PermissionSet::empty();
            for name in permissions {
                let permission = Permission::parse(name.as_ref()).map_err(|source| {
                    PolicyError::InvalidPermission {
                        role: role.clone(),
                        source,
                    }
                })?;
                set.grant(permission);
            }
            builder = builder.role(role, set)?;
        }
        Ok(builder.build())
    }

    /// Returns the permissions of a role (empty if the role is not mapped).
    pub fn permissions(&self, role: &Role) -> &PermissionSet {
        static EMPTY: PermissionSet = PermissionSet {
            permissions: BTreeSet::new(),
        };
        self.roles.get(role).unwrap_or(&EMPTY)
    }

    /// Returns whether `role` is granted `permission`.
    pub fn grants(&self, role: &Role, permission: &Permission) -> bool {
        self.roles
            .get(role)
            .is_some_and(|set| set.contains(permission))
    }

    /// Returns whether `role` has an entry in the map.
    pub fn contains_role(&self, role: &Role) -> bool {
        self.roles.contains_key(role)
    }

    /// Grants a permission to a known role. Returns `false` if the role is
    /// unrecognized or already had the permission.
    ///
    /// Intended for configuration time, before the map is shared.
    pub fn grant(&mut self, role: &Role, permission: Permission) -> bool {
        if !role.is_recognized() {
            return false;
        }
        self.roles
            .entry(role.clone())
            .or_default()
            .grant(permission)
    }

    /// Revokes a permission from a role. Returns `false` if it was not granted.
    pub fn revoke(&mut self, role: &Role, permission: &Permission) -> bool {
        self.roles
            .get_mut(role)
            .is_some_and(|set| set.revoke(permission))
    }

    /// Iterates over mapped roles and their permissions, in role order.
    pub fn iter(&self) -> impl Iterator<Item = (&Role, &PermissionSet)> {
        self.roles.iter()
    }

    /// Returns every permission that appears anywhere in the map.
    pub fn all_permissions(&self) -> BTreeSet<&Permission> {
        self.roles.values().flat_map(PermissionSet::iter).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for RoleMap {
    type Error = PolicyError;

    fn try_from(table: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        RoleMap::from_table(table)
    }
}

impl From<RoleMap> for BTreeMap<String, Vec<String>> {
    fn from(map: RoleMap) -> Self {
        map.roles
            .into_iter()
            .map(|(role, set)| {
                let names = set.iter().map(|p| p.as_str().to_string()).collect();
                (String::from(role), names)
            })
            .collect()
    }
}

/// Builder for [`RoleMap`] that rejects duplicate and unknown roles.
#[derive(Debug, Default)]
pub struct RoleMapBuilder {
    roles: BTreeMap<Role, PermissionSet>,
}

impl RoleMapBuilder {
    /// Adds a role with its permission set.
    pub fn role(
        mut self,
        role: Role,
        permissions: impl Into<PermissionSet>,
    ) -> Result<Self, PolicyError> {
        if let Role::Unrecognized(name) = &role {
            return Err(PolicyError::UnknownRole(name.to_string()));
        }
        if self.roles.contains_key(&role) {
            return Err(PolicyError::DuplicateRole(role));
        }
        self.roles.insert(role, permissions.into());
        Ok(self)
    }

    pub fn build(self) -> RoleMap {
        RoleMap { roles: self.roles }
    }
}
