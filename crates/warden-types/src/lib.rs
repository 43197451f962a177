//! # warden-types: Core types for `Warden`
//!
//! This crate contains the shared vocabulary of the access gate:
//! - Roles ([`Role`]), a closed set with an explicit [`Role::Unrecognized`] variant
//! - Permissions ([`Permission`]), validated action names
//! - Subjects ([`Subject`]), the actor currently evaluated for access
//!
//! Unknown role strings are representable rather than rejected, so that
//! evaluation can fail closed on them instead of erroring.

use std::{
    borrow::Borrow,
    convert::Infallible,
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length in bytes of a permission name.
pub const MAX_PERMISSION_LEN: usize = 64;

// ============================================================================
// Errors
// ============================================================================

/// Error raised when a value cannot be turned into one of the core types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The permission name is empty, too long or contains invalid characters.
    #[error("invalid permission name {name:?}: {reason}")]
    InvalidPermission { name: String, reason: &'static str },
}

// ============================================================================
// Role
// ============================================================================

/// Role held by a subject.
///
/// The three known roles are ordered from most to least privileged in the
/// reference role map, but no ordering is implied between them here: a role
/// only confers what the configured role map grants it.
///
/// Any string that does not name a known role parses to
/// [`Role::Unrecognized`]. Such roles never match an allowed-role set and
/// have no permissions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Full access to every protected region.
    Admin,

    /// Can view and edit content but not perform destructive operations.
    Editor,

    /// Read-only access.
    Viewer,

    /// A role name the gate does not know. Kept verbatim for diagnostics.
    ///
    /// Only [`Role::parse`] builds this variant, so it never holds a name
    /// that parses to a known role.
    Unrecognized(UnrecognizedRole),
}

/// Name of a role the gate does not know.
///
/// Cannot be constructed outside [`Role::parse`], which guarantees the name
/// does not collide with a known role in any casing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnrecognizedRole(String);

impl UnrecognizedRole {
    /// Returns the role name as it was parsed (trimmed).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UnrecognizedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Role {
    /// All roles the gate knows about.
    pub const KNOWN: [Role; 3] = [Role::Admin, Role::Editor, Role::Viewer];

    /// Parses a role name.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_types::Role;
    ///
    /// assert_eq!(Role::parse("Admin"), Role::Admin);
    /// assert_eq!(Role::parse(" editor "), Role::Editor);
    /// assert!(!Role::parse("superadmin").is_recognized());
    /// ```
    pub fn parse(name: &str) -> Role {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else if trimmed.eq_ignore_ascii_case("editor") {
            Role::Editor
        } else if trimmed.eq_ignore_ascii_case("viewer") {
            Role::Viewer
        } else {
            Role::Unrecognized(UnrecognizedRole(trimmed.to_string()))
        }
    }

    /// Returns the canonical name of this role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
            Role::Unrecognized(name) => name.as_str(),
        }
    }

    /// Returns whether this is one of the [`Role::KNOWN`] roles.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Role::Unrecognized(_))
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(s))
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::parse(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Unrecognized(name) => name.0,
            known => known.as_str().to_string(),
        }
    }
}

// ============================================================================
// Permission
// ============================================================================

/// A named action a subject may or may not perform (e.g. `delete_post`).
///
/// Names are lowercase snake case: they start with an ASCII lowercase letter,
/// contain only `[a-z0-9_]`, and are at most [`MAX_PERMISSION_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    /// Validates and creates a permission.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_types::Permission;
    ///
    /// let p = Permission::parse("view_dashboard").unwrap();
    /// assert_eq!(p.as_str(), "view_dashboard");
    ///
    /// assert!(Permission::parse("").is_err());
    /// assert!(Permission::parse("Delete Post").is_err());
    /// ```
    pub fn parse(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_permission_name(&name)?;
        Ok(Self(name))
    }

    /// Returns the permission name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_permission_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason| TypeError::InvalidPermission {
        name: name.to_string(),
        reason,
    };

    let Some(first) = name.bytes().next() else {
        return Err(invalid("empty"));
    };
    if name.len() > MAX_PERMISSION_LEN {
        return Err(invalid("longer than 64 bytes"));
    }
    if !first.is_ascii_lowercase() {
        return Err(invalid("must start with a lowercase letter"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    {
        return Err(invalid("only [a-z0-9_] allowed"));
    }
    Ok(())
}

impl Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Permission {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::parse(s)
    }
}

impl TryFrom<String> for Permission {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Permission::parse(value)
    }
}

impl TryFrom<&str> for Permission {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Permission::parse(value)
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.0
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Subject
// ============================================================================

/// The authenticated actor evaluated for access.
///
/// Credentials are validated elsewhere; a `Subject` is trusted as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    /// Username, also used as the subject identifier.
    pub username: String,

    /// Role conferring the subject's permissions.
    pub role: Role,
}

impl Subject {
    pub fn new(username: impl Into<String>, role: impl Into<Role>) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}
