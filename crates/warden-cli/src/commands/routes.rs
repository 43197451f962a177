//! Route commands - list the route table and resolve single paths.

use std::process::ExitCode;

use anyhow::Result;
use warden_rbac::RouteOutcome;

use super::{Project, acting_subject, exit_code};
use crate::style::{styled_outcome, styled_table};

/// Lists every route with its rule and, for the acting role, its outcome.
pub fn list(project: &Project, role: Option<&str>) -> Result<()> {
    let subject = acting_subject(role, "cli");
    let acting_as = role.map_or_else(|| "anonymous".to_string(), str::to_string);

    let rows: Vec<Vec<String>> = project
        .routes
        .iter()
        .map(|(path, access)| {
            let outcome = project
                .routes
                .resolve(path, &project.role_map, subject.as_ref());
            vec![path.to_string(), access.to_string(), outcome.to_string()]
        })
        .collect();

    let header = format!("as {acting_as}");
    println!(
        "{}",
        styled_table(&["Path", "Access", header.as_str()], &rows)
    );
    Ok(())
}

/// Resolves one path. Exit code 1 unless the route renders.
pub fn resolve(project: &Project, path: &str, role: Option<&str>) -> Result<ExitCode> {
    let subject = acting_subject(role, "cli");
    let outcome = project
        .routes
        .resolve(path, &project.role_map, subject.as_ref());

    println!("{}", styled_outcome(&outcome));
    Ok(exit_code(matches!(outcome, RouteOutcome::Render { .. })))
}
