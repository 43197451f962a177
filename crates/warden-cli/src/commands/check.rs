//! Check command - evaluate one requirement for one subject.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use warden_rbac::{Access, Decision, Gate, IdentityStore, Requirement, evaluator};
use warden_types::{Permission, Role};

use super::{Project, acting_subject, exit_code};
use crate::style::{print_hint, styled_decision};

/// What to check.
pub enum Target<'a> {
    Permission(&'a str),
    Roles(&'a [String]),
}

pub fn run(
    project: &Project,
    role: Option<&str>,
    user: &str,
    target: Target<'_>,
    json: bool,
) -> Result<ExitCode> {
    let store = IdentityStore::shared();
    let subject = acting_subject(role, user);
    if let Some(subject) = subject.clone() {
        store.login(subject);
    }

    let requirement = match target {
        Target::Permission(action) => Requirement::permission(
            Permission::parse(action).with_context(|| format!("Invalid permission {action:?}"))?,
        ),
        Target::Roles(names) => Requirement::any_role(names.iter().map(|n| Role::parse(n))),
    };

    let mut builder = Gate::builder()
        .identity(Arc::clone(&store))
        .role_map(Arc::clone(&project.role_map))
        .redirects(project.config.redirects())
        .label("cli-check")
        .require(requirement.clone());
    if !project.config.audit.enabled {
        builder = builder.without_audit();
    }
    let gate = builder.build().context("Failed to build gate")?;

    let access = gate.guard(|| ());
    let decision = match &access {
        Access::Granted(()) => Decision::Allowed,
        Access::Denied(denial) => Decision::Denied(denial.reason),
    };
    let explanation = evaluator::explain(&project.role_map, subject.as_ref(), &requirement);

    if json {
        let redirect = match &access {
            Access::Granted(()) => None,
            Access::Denied(denial) => Some(denial.redirect.clone()),
        };
        let output = serde_json::json!({
            "subject": subject,
            "requirement": requirement.to_string(),
            "decision": decision,
            "redirect": redirect,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        // The explanation already starts with the decision.
        let detail = explanation
            .split_once(": ")
            .map_or(explanation.as_str(), |(_, rest)| rest);
        println!("{} {detail}", styled_decision(decision));
        if let Access::Denied(denial) = &access {
            print_hint(&format!("redirect to {}", denial.redirect));
        }
    }

    Ok(exit_code(access.is_granted()))
}
