//! Focused CLI argument parsing tests.
//!
//! Tests that verify command-line argument parsing and exit codes without
//! touching a real project configuration.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn warden(project: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("warden").unwrap();
    cmd.arg("--project").arg(project.path()).arg("--no-color");
    cmd
}

// ============================================================================
// Global Flags
// ============================================================================

#[test]
fn version_command_succeeds() {
    Command::cargo_bin("warden")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("warden"));
}

#[test]
fn version_flag_shows_version() {
    Command::cargo_bin("warden")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("warden"));
}

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("warden")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("client-side role and permission gate"));
}

#[test]
fn unknown_command_fails() {
    Command::cargo_bin("warden")
        .unwrap()
        .arg("teleport")
        .assert()
        .failure()
        .code(2);
}

// ============================================================================
// Check Arguments
// ============================================================================

#[test]
fn check_requires_subject() {
    let project = TempDir::new().unwrap();
    warden(&project)
        .args(["check", "--permission", "view_dashboard"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--role"));
}

#[test]
fn check_requires_requirement() {
    let project = TempDir::new().unwrap();
    warden(&project)
        .args(["check", "--role", "admin"])
        .assert()
        .code(2);
}

#[test]
fn check_rejects_role_with_anonymous() {
    let project = TempDir::new().unwrap();
    warden(&project)
        .args([
            "check",
            "--role",
            "admin",
            "--anonymous",
            "--permission",
            "view_dashboard",
        ])
        .assert()
        .code(2);
}

#[test]
fn check_rejects_permission_with_roles() {
    let project = TempDir::new().unwrap();
    warden(&project)
        .args([
            "check",
            "--role",
            "admin",
            "--permission",
            "view_dashboard",
            "--roles",
            "admin",
        ])
        .assert()
        .code(2);
}

#[test]
fn check_invalid_permission_name_is_an_error() {
    let project = TempDir::new().unwrap();
    warden(&project)
        .args(["check", "--role", "admin", "--permission", "Delete Post"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid permission"));
}

// ============================================================================
// Other Commands
// ============================================================================

#[test]
fn resolve_requires_path() {
    let project = TempDir::new().unwrap();
    warden(&project).arg("resolve").assert().code(2);
}

#[test]
fn session_missing_script_fails() {
    let project = TempDir::new().unwrap();
    let missing = project.path().join("missing.txt");

    warden(&project)
        .arg("session")
        .arg(&missing)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read script"));
}

#[test]
fn config_show_json_format() {
    let project = TempDir::new().unwrap();
    warden(&project)
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unauthorized\": \"/unauthorized\""));
}
