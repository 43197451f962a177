//! Session command - replay a login/logout/visit/check script against one
//! identity store.
//!
//! Script format, one step per line (`#` starts a comment):
//!
//! ```text
//! login alice editor
//! visit /editor
//! check delete_post
//! logout
//! visit /editor
//! ```

use std::fs;
use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use warden_rbac::{Access, Decision, Gate, IdentityEvent, IdentityStore, evaluator};
use warden_types::{Permission, Role, Subject};

use super::Project;
use crate::style::{
    colors::SemanticStyle, print_hint, print_success, print_warn, styled_decision, styled_outcome,
};

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Login { username: String, role: Role },
    Logout,
    Visit(String),
    Check(Permission),
}

/// Parses a session script. Errors carry the 1-based line number.
pub fn parse_script(script: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();

    for (index, raw) in script.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let step = match words.as_slice() {
            ["login", username, role] => Step::Login {
                username: (*username).to_string(),
                role: Role::parse(role),
            },
            ["logout"] => Step::Logout,
            ["visit", path] => Step::Visit((*path).to_string()),
            ["check", action] => Step::Check(
                Permission::parse(*action)
                    .with_context(|| format!("line {line_no}: invalid permission"))?,
            ),
            ["login", ..] => bail!("line {line_no}: expected `login <user> <role>`"),
            ["visit", ..] => bail!("line {line_no}: expected `visit <path>`"),
            ["check", ..] => bail!("line {line_no}: expected `check <permission>`"),
            [other, ..] => bail!("line {line_no}: unknown step '{other}'"),
            [] => continue,
        };
        steps.push(step);
    }

    Ok(steps)
}

/// Drops a `#` comment that starts the line or follows whitespace, so
/// fragments like `/page#section` stay intact.
fn strip_comment(line: &str) -> &str {
    let mut previous = None;
    for (index, c) in line.char_indices() {
        if c == '#' && previous.is_none_or(char::is_whitespace) {
            return &line[..index];
        }
        previous = Some(c);
    }
    line
}

/// Reads the script from `path` (`-` for stdin) and replays it.
pub fn run(project: &Project, path: &str) -> Result<()> {
    let script = if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read script from stdin")?;
        buffer
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read script '{path}'"))?
    };

    let steps = parse_script(&script)?;
    replay(project, &steps)
}

/// Replays parsed steps against a fresh identity store.
pub fn replay(project: &Project, steps: &[Step]) -> Result<()> {
    let store = IdentityStore::shared();
    let subscription = store.subscribe(|event| match event {
        IdentityEvent::LoggedIn(subject) => print_success(&format!("logged in as {subject}")),
        IdentityEvent::LoggedOut => print_success("logged out"),
    });

    for step in steps {
        match step {
            Step::Login { username, role } => {
                store.login(Subject::new(username.as_str(), role.clone()));
            }
            Step::Logout => {
                if !store.logout() {
                    print_warn("logout while anonymous, nothing to do");
                }
            }
            Step::Visit(path) => {
                let identity = store.current_subject();
                let outcome = project
                    .routes
                    .resolve(path, &project.role_map, identity.subject());
                println!("{} {}", format!("visit {path}:").muted(), styled_outcome(&outcome));
            }
            Step::Check(action) => check(project, &store, action)?,
        }
    }

    store.unsubscribe(subscription);
    Ok(())
}

fn check(project: &Project, store: &Arc<IdentityStore>, action: &Permission) -> Result<()> {
    let mut builder = Gate::builder()
        .identity(Arc::clone(store))
        .role_map(Arc::clone(&project.role_map))
        .redirects(project.config.redirects())
        .label("session")
        .require_permission(action.clone());
    if !project.config.audit.enabled {
        builder = builder.without_audit();
    }
    let gate = builder.build().context("Failed to build gate")?;

    let label = format!("check {action}:");
    match gate.guard(|| ()) {
        Access::Granted(()) => {
            println!("{} {}", label.muted(), styled_decision(Decision::Allowed));
        }
        Access::Denied(denial) => {
            println!(
                "{} {}",
                label.muted(),
                styled_decision(Decision::Denied(denial.reason))
            );
            let identity = store.current_subject();
            let explanation =
                evaluator::explain(&project.role_map, identity.subject(), gate.requirement());
            print_hint(&format!("{explanation}, redirect to {}", denial.redirect));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_full_script() {
        let script = "\
# editor walks the app
login alice editor
visit /editor
check delete_post   # not granted

logout
";
        let steps = parse_script(script).unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Login {
                    username: "alice".to_string(),
                    role: Role::Editor
                },
                Step::Visit("/editor".to_string()),
                Step::Check(Permission::parse("delete_post").unwrap()),
                Step::Logout,
            ]
        );
    }

    #[test]
    fn test_parse_unknown_role_is_kept() {
        let steps = parse_script("login root superadmin").unwrap();
        assert_eq!(
            steps,
            vec![Step::Login {
                username: "root".to_string(),
                role: Role::parse("superadmin")
            }]
        );
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_script("logout\nlogin alice").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = parse_script("dance").unwrap_err();
        assert!(err.to_string().contains("unknown step 'dance'"));

        let err = parse_script("\n\ncheck Delete-Post").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_parse_keeps_fragment_in_path() {
        let steps = parse_script("visit /page#section\nvisit /docs#intro # jump").unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Visit("/page#section".to_string()),
                Step::Visit("/docs#intro".to_string()),
            ]
        );
    }

    #[test_case("# only a comment", ""; "whole line")]
    #[test_case("logout # bye", "logout "; "after whitespace")]
    #[test_case("logout\t# bye", "logout\t"; "after tab")]
    #[test_case("visit /a#b", "visit /a#b"; "inside a word")]
    fn test_strip_comment(line: &str, expected: &str) {
        assert_eq!(strip_comment(line), expected);
    }

    #[test]
    fn test_parse_empty_script() {
        assert!(parse_script("# nothing\n\n   \n").unwrap().is_empty());
    }
}
