//! CLI command implementations.

pub mod check;
pub mod config;
pub mod routes;
pub mod session;
pub mod version;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use warden_config::WardenConfig;
use warden_rbac::{RoleMap, RouteTable};
use warden_types::{Role, Subject};

/// Exit code for a denied check, distinct from errors.
pub const EXIT_DENIED: u8 = 1;

/// Everything a command needs from the project configuration.
pub struct Project {
    pub dir: PathBuf,
    pub config: WardenConfig,
    pub role_map: Arc<RoleMap>,
    pub routes: RouteTable,
}

impl Project {
    /// Loads and validates the configuration of `project_dir`.
    pub fn load(project_dir: &str) -> Result<Self> {
        let config = WardenConfig::load_from_dir(Path::new(project_dir))
            .with_context(|| format!("Failed to load configuration from {project_dir}"))?;

        let role_map = config.role_map().context("Invalid role map")?;
        let routes = config.route_table().context("Invalid routes")?;

        Ok(Self {
            dir: PathBuf::from(project_dir),
            config,
            role_map: Arc::new(role_map),
            routes,
        })
    }
}

/// Builds the subject a command acts as (`None` for anonymous).
pub fn acting_subject(role: Option<&str>, user: &str) -> Option<Subject> {
    role.map(|r| Subject::new(user, Role::parse(r)))
}

/// Maps an allow/deny outcome to the process exit code.
pub fn exit_code(allowed: bool) -> ExitCode {
    if allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DENIED)
    }
}
