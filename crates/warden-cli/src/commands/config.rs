//! Configuration commands.

use anyhow::Result;
use warden_config::Paths;

use super::Project;
use crate::style::{colors::SemanticStyle, info_table, print_labeled};

/// Show the effective configuration.
pub fn show(project: &Project, format: &str) -> Result<()> {
    let config = &project.config;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{json}");
        }
        "toml" => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{toml_str}");
        }
        _ => {
            println!("{}", "Warden Configuration".header());
            println!();

            print_labeled("Project", &config.project.name);
            let project_file = Paths::project_config_file(&project.dir);
            let project_file_state = if Paths::is_initialized(&project.dir) {
                "found"
            } else {
                "not found, using defaults"
            };
            print_labeled(
                "Project file",
                &format!("{} ({project_file_state})", project_file.display()),
            );
            if let Ok(user_file) = Paths::new().user_config_file() {
                print_labeled("User file", &user_file.display().to_string());
            }
            print_labeled("Login redirect", &config.redirects.login);
            print_labeled("Unauthorized redirect", &config.redirects.unauthorized);
            print_labeled("Audit", if config.audit.enabled { "enabled" } else { "disabled" });
            println!();

            println!("{}", "Roles".header());
            let entries: Vec<(&str, String)> = project
                .role_map
                .iter()
                .map(|(role, permissions)| {
                    let names: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
                    (role.as_str(), names.join(", "))
                })
                .collect();
            println!("{}", info_table(&entries));

            let known: Vec<&str> = project
                .role_map
                .all_permissions()
                .into_iter()
                .map(|p| p.as_str())
                .collect();
            print_labeled("Known permissions", &known.join(", "));
        }
    }

    Ok(())
}
