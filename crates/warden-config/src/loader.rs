//! Configuration loader with multi-source merging

use crate::{ConfigError, Paths, RouteDefinition, WardenConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "WARDEN".to_string(),
            include_user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "WARDEN")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/warden/config.toml (used by tests)
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    ///
    /// `[roles]` and `[[routes]]` are not merged across layers: each is taken
    /// whole from the highest-precedence file that defines it, and the
    /// environment cannot change them.
    pub fn load(self) -> Result<WardenConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = WardenConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2-4. User config, project config (warden.toml), local config
        // (warden.local.toml, gitignored), lowest precedence first
        let files = self.config_files();
        for file in &files {
            builder = builder.add_source(
                config::File::from(file.as_path())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (WARDEN_*)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let mut warden_config: WardenConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        let whole = read_whole_tables(&files)?;
        warden_config.roles = whole.roles;
        warden_config.routes = whole.routes;

        // Malformed role maps and routes are fatal at load time
        warden_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(warden_config)
    }

    /// Existing config files, lowest precedence first.
    fn config_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        if self.include_user_config {
            if let Ok(user_config_file) = Paths::new().user_config_file() {
                files.push(user_config_file);
            }
        }
        files.push(Paths::project_config_file(&self.project_dir));
        files.push(Paths::local_config_file(&self.project_dir));

        files.retain(|file| file.exists());
        files
    }
}

/// The tables that replace instead of merge.
#[derive(Debug, Default, Deserialize)]
struct WholeTables {
    roles: Option<BTreeMap<String, Vec<String>>>,
    routes: Option<Vec<RouteDefinition>>,
}

/// Reads `[roles]` and `[[routes]]` from each file; later files win.
fn read_whole_tables(files: &[PathBuf]) -> Result<WholeTables, ConfigError> {
    let mut tables = WholeTables::default();

    for path in files {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;
        let layer: WholeTables =
            toml::from_str(&content).map_err(|source| ConfigError::ParseError {
                path: path.clone(),
                source,
            })?;

        if layer.roles.is_some() {
            tables.roles = layer.roles;
        }
        if layer.routes.is_some() {
            tables.routes = layer.routes;
        }
    }

    Ok(tables)
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
