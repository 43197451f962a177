//! Route table: requirements per path and the redirect each denial implies.
//!
//! Resolution only reports what should happen; performing the navigation is
//! left to the caller's router.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use warden_types::{Permission, Role, Subject};

use crate::evaluator::{self, Decision, DenialReason};
use crate::permissions::RoleMap;
use crate::policy::Requirement;

/// Where a denied caller should be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Redirects {
    /// Target for `Unauthenticated` denials.
    pub login: String,

    /// Target for `Forbidden` denials.
    pub unauthorized: String,
}

impl Redirects {
    pub fn new(login: impl Into<String>, unauthorized: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            unauthorized: unauthorized.into(),
        }
    }

    /// Returns the redirect target for a denial reason.
    pub fn target(&self, reason: DenialReason) -> &str {
        match reason {
            DenialReason::Unauthenticated => &self.login,
            DenialReason::Forbidden => &self.unauthorized,
        }
    }
}

impl Default for Redirects {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            unauthorized: "/unauthorized".to_string(),
        }
    }
}

/// Access rule for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    /// Anyone, including anonymous callers.
    Public,

    /// Only subjects satisfying the requirement.
    Protected(Requirement),
}

impl Display for RouteAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteAccess::Public => f.write_str("public"),
            RouteAccess::Protected(requirement) => Display::fmt(requirement, f),
        }
    }
}

/// What the caller should do for a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Render the route.
    Render { path: String },

    /// Do not render; navigate to `to` instead.
    Redirect { to: String, reason: DenialReason },

    /// No route is registered for the path.
    NotFound { path: String },
}

impl Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteOutcome::Render { path } => write!(f, "render {path}"),
            RouteOutcome::Redirect { to, reason } => write!(f, "redirect {to} ({reason})"),
            RouteOutcome::NotFound { path } => write!(f, "not found {path}"),
        }
    }
}

/// Path → access rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<String, RouteAccess>,
    redirects: Redirects,
}

impl RouteTable {
    /// Creates an empty table with the given redirect targets.
    pub fn new(redirects: Redirects) -> Self {
        Self {
            routes: BTreeMap::new(),
            redirects,
        }
    }

    /// The reference routing setup:
    ///
    /// | Path            | Access                         |
    /// |-----------------|--------------------------------|
    /// | `/login`        | public                         |
    /// | `/unauthorized` | public                         |
    /// | `/admin`        | role in {admin}                |
    /// | `/editor`       | role in {admin, editor}        |
    /// | `/dashboard`    | permission `view_dashboard`    |
    pub fn standard() -> Self {
        let mut table = Self::new(Redirects::default())
            .public("/login")
            .public("/unauthorized")
            .protect("/admin", Requirement::any_role([Role::Admin]))
            .protect("/editor", Requirement::any_role([Role::Admin, Role::Editor]));
        if let Ok(view) = Permission::parse("view_dashboard") {
            table = table.protect("/dashboard", Requirement::permission(view));
        }
        table
    }

    /// Replaces the redirect targets, keeping every registered route.
    pub fn with_redirects(mut self, redirects: Redirects) -> Self {
        self.redirects = redirects;
        self
    }

    /// Registers a public path.
    pub fn public(mut self, path: &str) -> Self {
        self.routes.insert(normalize_path(path), RouteAccess::Public);
        self
    }

    /// Registers a protected path. Re-registering a path replaces its rule.
    pub fn protect(mut self, path: &str, requirement: Requirement) -> Self {
        self.routes
            .insert(normalize_path(path), RouteAccess::Protected(requirement));
        self
    }

    /// Returns the rule registered for `path`.
    pub fn access(&self, path: &str) -> Option<&RouteAccess> {
        self.routes.get(&normalize_path(path))
    }

    /// Resolves a path for the given subject.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_rbac::{RoleMap, RouteOutcome, RouteTable};
    /// use warden_rbac::evaluator::DenialReason;
    ///
    /// let routes = RouteTable::standard();
    /// let outcome = routes.resolve("/admin", &RoleMap::standard(), None);
    /// assert_eq!(
    ///     outcome,
    ///     RouteOutcome::Redirect { to: "/login".into(), reason: DenialReason::Unauthenticated }
    /// );
    /// ```
    pub fn resolve(&self, path: &str, role_map: &RoleMap, subject: Option<&Subject>) -> RouteOutcome {
        let path = normalize_path(path);
        match self.routes.get(&path) {
            None => RouteOutcome::NotFound { path },
            Some(RouteAccess::Public) => RouteOutcome::Render { path },
            Some(RouteAccess::Protected(requirement)) => {
                match evaluator::evaluate(role_map, subject, requirement) {
                    Decision::Allowed => RouteOutcome::Render { path },
                    Decision::Denied(reason) => RouteOutcome::Redirect {
                        to: self.redirects.target(reason).to_string(),
                        reason,
                    },
                }
            }
        }
    }

    pub fn redirects(&self) -> &Redirects {
        &self.redirects
    }

    /// Iterates over registered paths in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteAccess)> {
        self.routes.iter().map(|(path, access)| (path.as_str(), access))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Normalizes a path the way the route table keys it: surrounding
/// whitespace trimmed, leading slash added, trailing slashes dropped
/// (except for the root).
///
/// Two paths address the same route exactly when their normalized forms
/// are equal.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/admin", "/admin"; "already normal")]
    #[test_case("/admin/", "/admin"; "trailing slash")]
    #[test_case("admin", "/admin"; "missing leading slash")]
    #[test_case("/", "/"; "root")]
    #[test_case("", "/"; "empty")]
    #[test_case("///", "/"; "only slashes")]
    #[test_case(" /admin ", "/admin"; "surrounding whitespace")]
    fn test_normalize(input: &str, expected: &str) {
        assert_eq!(normalize_path(input), expected);
    }

    #[test_case(None, "/admin", RouteOutcome::Redirect { to: "/login".into(), reason: DenialReason::Unauthenticated }; "anonymous admin")]
    #[test_case(Some("admin"), "/admin", RouteOutcome::Render { path: "/admin".into() }; "admin admin")]
    #[test_case(Some("editor"), "/admin", RouteOutcome::Redirect { to: "/unauthorized".into(), reason: DenialReason::Forbidden }; "editor admin")]
    #[test_case(Some("editor"), "/editor/", RouteOutcome::Render { path: "/editor".into() }; "editor editor")]
    #[test_case(Some("viewer"), "/dashboard", RouteOutcome::Render { path: "/dashboard".into() }; "viewer dashboard")]
    #[test_case(Some("superadmin"), "/dashboard", RouteOutcome::Redirect { to: "/unauthorized".into(), reason: DenialReason::Forbidden }; "unknown dashboard")]
    #[test_case(None, "/login", RouteOutcome::Render { path: "/login".into() }; "anonymous login")]
    #[test_case(Some("admin"), "/settings", RouteOutcome::NotFound { path: "/settings".into() }; "unknown path")]
    fn test_standard_routes(role: Option<&str>, path: &str, expected: RouteOutcome) {
        let routes = RouteTable::standard();
        let map = RoleMap::standard();
        let subject = role.map(|r| Subject::new("TestUser", r));

        assert_eq!(routes.resolve(path, &map, subject.as_ref()), expected);
    }

    #[test]
    fn test_custom_redirects() {
        let routes = RouteTable::new(Redirects::new("/signin", "/403"))
            .protect("/admin", Requirement::any_role([Role::Admin]));
        let map = RoleMap::standard();
        let viewer = Subject::new("TestUser", "viewer");

        assert_eq!(
            routes.resolve("/admin", &map, Some(&viewer)),
            RouteOutcome::Redirect {
                to: "/403".into(),
                reason: DenialReason::Forbidden
            }
        );
        assert_eq!(
            routes.resolve("/admin", &map, None),
            RouteOutcome::Redirect {
                to: "/signin".into(),
                reason: DenialReason::Unauthenticated
            }
        );
    }

    #[test]
    fn test_with_redirects_keeps_routes() {
        let routes = RouteTable::standard().with_redirects(Redirects::new("/signin", "/403"));
        let map = RoleMap::standard();

        assert_eq!(routes.len(), 5);
        assert_eq!(
            routes.resolve("/editor", &map, None),
            RouteOutcome::Redirect {
                to: "/signin".into(),
                reason: DenialReason::Unauthenticated
            }
        );
    }

    #[test]
    fn test_reprotect_replaces_rule() {
        let routes = RouteTable::default()
            .public("/reports")
            .protect("/reports/", Requirement::any_role([Role::Admin]));

        assert_eq!(routes.len(), 1);
        assert!(matches!(
            routes.access("/reports"),
            Some(RouteAccess::Protected(_))
        ));
    }

    #[test]
    fn test_standard_table_contents() {
        let routes = RouteTable::standard();
        assert_eq!(routes.len(), 5);

        let paths: Vec<&str> = routes.iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            ["/admin", "/dashboard", "/editor", "/login", "/unauthorized"]
        );
        assert_eq!(routes.access("/login"), Some(&RouteAccess::Public));
    }
}
