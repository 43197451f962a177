//! Configuration management for Warden
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (WARDEN_* prefix, highest precedence)
//! 2. warden.local.toml (gitignored, local overrides)
//! 3. warden.toml (git-tracked, project config)
//! 4. ~/.config/warden/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! The role map and route table are read as whole values: `[roles]` and
//! `[[routes]]` come from the highest-precedence file that defines them and
//! are never merged with lower layers or the environment, so the map stays
//! fully enumerated.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use warden_rbac::{Redirects, Requirement, RoleMap, RouteTable, normalize_path};
use warden_types::{Permission, Role};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main Warden configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub project: ProjectConfig,
    /// Role name → permission names. `None` selects [`RoleMap::standard`].
    pub roles: Option<BTreeMap<String, Vec<String>>>,
    pub redirects: RedirectsConfig,
    /// Route definitions. `None` selects [`RouteTable::standard`] with the
    /// configured redirects.
    pub routes: Option<Vec<RouteDefinition>>,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "warden-project".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectsConfig {
    pub login: String,
    pub unauthorized: String,
}

impl Default for RedirectsConfig {
    fn default() -> Self {
        let defaults = Redirects::default();
        Self {
            login: defaults.login,
            unauthorized: defaults.unauthorized,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Log every gate decision through `tracing`.
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Route definition from config.
///
/// Exactly one of `public`, `allowed_roles` or `permission` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub path: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

impl RouteDefinition {
    /// Converts the definition into a requirement (`None` for public routes).
    pub fn requirement(&self) -> Result<Option<Requirement>, ConfigError> {
        let invalid = |reason: &str| ConfigError::RouteError {
            path: self.path.clone(),
            reason: reason.to_string(),
        };

        match (self.public, &self.allowed_roles, &self.permission) {
            (true, None, None) => Ok(None),
            (false, Some(names), None) => {
                let mut roles = Vec::with_capacity(names.len());
                for name in names {
                    let role = Role::parse(name);
                    if !role.is_recognized() {
                        return Err(invalid(&format!("unknown role {name:?}")));
                    }
                    roles.push(role);
                }
                Ok(Some(Requirement::any_role(roles)))
            }
            (false, None, Some(name)) => {
                let permission =
                    Permission::parse(name.as_str()).map_err(|e| invalid(&e.to_string()))?;
                Ok(Some(Requirement::permission(permission)))
            }
            (false, None, None) => Err(invalid(
                "one of public, allowed_roles or permission is required",
            )),
            _ => Err(invalid(
                "only one of public, allowed_roles or permission may be set",
            )),
        }
    }
}

impl WardenConfig {
    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parses a single TOML document (no layering).
    pub fn from_toml_str(content: &str, origin: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::ParseError {
            path: origin.as_ref().to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the role map, rejecting malformed tables.
    pub fn role_map(&self) -> Result<RoleMap, ConfigError> {
        match &self.roles {
            None => Ok(RoleMap::standard()),
            Some(table) => Ok(RoleMap::from_table(table)?),
        }
    }

    pub fn redirects(&self) -> Redirects {
        Redirects::new(&self.redirects.login, &self.redirects.unauthorized)
    }

    /// Builds the route table, rejecting malformed route definitions.
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        let Some(definitions) = &self.routes else {
            return Ok(RouteTable::standard().with_redirects(self.redirects()));
        };

        let mut table = RouteTable::new(self.redirects());
        for definition in definitions {
            table = match definition.requirement()? {
                None => table.public(&definition.path),
                Some(requirement) => table.protect(&definition.path, requirement),
            };
        }
        Ok(table)
    }

    /// Checks the whole configuration. Every problem here is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, target) in [
            ("login", &self.redirects.login),
            ("unauthorized", &self.redirects.unauthorized),
        ] {
            if !target.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "redirects.{name} must be an absolute path, got {target:?}"
                )));
            }
        }

        self.role_map()?;

        if let Some(definitions) = &self.routes {
            let mut seen = std::collections::BTreeSet::new();
            for definition in definitions {
                if definition.path.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "route path must not be empty".to_string(),
                    ));
                }
                if !seen.insert(normalize_path(&definition.path)) {
                    return Err(ConfigError::RouteError {
                        path: definition.path.clone(),
                        reason: "defined more than once".to_string(),
                    });
                }
                definition.requirement()?;
            }
        }
        Ok(())
    }
}
