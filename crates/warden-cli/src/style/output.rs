//! Output helper functions for consistent styled messages.

use super::colors::SemanticStyle;
use warden_rbac::{Decision, RouteOutcome};

/// Prints a success message with a checkmark.
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".success(), msg);
}

/// Prints an error message with an X mark.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".error(), msg);
}

/// Prints a warning message with a warning symbol.
pub fn print_warn(msg: &str) {
    println!("{} {}", "⚠".warning(), msg);
}

/// Prints a hint/suggestion with an arrow.
pub fn print_hint(msg: &str) {
    println!("{} {}", "→".muted(), msg.muted());
}

/// Prints a labeled key-value pair with proper indentation.
pub fn print_labeled(key: &str, value: &str) {
    println!("  {}: {}", key.muted(), value);
}

/// Formats a decision, green when allowed and red when denied.
pub fn styled_decision(decision: Decision) -> String {
    if decision.is_allowed() {
        decision.success()
    } else {
        decision.error()
    }
}

/// Formats a route outcome, green when rendered and red otherwise.
pub fn styled_outcome(outcome: &RouteOutcome) -> String {
    match outcome {
        RouteOutcome::Render { .. } => outcome.success(),
        RouteOutcome::Redirect { .. } => outcome.error(),
        RouteOutcome::NotFound { .. } => outcome.warning(),
    }
}
