//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;
use warden_rbac::PolicyError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid role map: {0}")]
    RoleMapError(#[from] PolicyError),

    #[error("Invalid route {path}: {reason}")]
    RouteError { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("XDG directory error: {0}")]
    XdgError(String),
}
