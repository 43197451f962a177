//! Warden CLI.
//!
//! Inspect and exercise the client-side access gate of a project.
//!
//! # Quick Start
//!
//! ```bash
//! # Can an editor delete posts?
//! warden check --role editor --permission delete_post
//!
//! # Where does /admin send an anonymous visitor?
//! warden resolve /admin
//!
//! # Replay a login/logout flow
//! warden session flow.txt
//! ```

mod commands;
mod style;

use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use commands::Project;
use commands::check::Target;

/// Exit code for usage, configuration and I/O errors.
const EXIT_ERROR: u8 = 2;

/// Warden - client-side role and permission gate.
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory containing warden.toml.
    #[arg(short, long, global = true, default_value = ".")]
    project: String,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Check whether a subject passes a requirement.
    #[command(group(ArgGroup::new("who").required(true).args(["role", "anonymous"])))]
    #[command(group(ArgGroup::new("what").required(true).args(["permission", "roles"])))]
    Check {
        /// Role of the acting subject.
        #[arg(short, long)]
        role: Option<String>,

        /// Check without a logged-in subject.
        #[arg(long)]
        anonymous: bool,

        /// Username of the acting subject.
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Permission the subject must hold.
        #[arg(long)]
        permission: Option<String>,

        /// Roles allowed through (comma-separated).
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List routes and their outcome for a role.
    Routes {
        /// Role to resolve as (anonymous when omitted).
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Resolve a single path.
    Resolve {
        /// Path to resolve.
        path: String,

        /// Role to resolve as (anonymous when omitted).
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Replay a login/logout/visit/check script.
    Session {
        /// Script file (`-` for stdin).
        script: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show {
        /// Output format (text, json, toml).
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() || !console::Term::stdout().is_term()
    {
        style::set_no_color(true);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            style::print_error(&format!("{e:#}"));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let project_dir = cli.project;
    let load = || Project::load(&project_dir);

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            role,
            anonymous: _,
            user,
            permission,
            roles,
            json,
        } => {
            let target = match &permission {
                Some(action) => Target::Permission(action),
                None => Target::Roles(&roles),
            };
            commands::check::run(&load()?, role.as_deref(), &user, target, json)
        }
        Commands::Routes { role } => {
            commands::routes::list(&load()?, role.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve { path, role } => {
            commands::routes::resolve(&load()?, &path, role.as_deref())
        }
        Commands::Config(ConfigCommands::Show { format }) => {
            commands::config::show(&load()?, &format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Session { script } => {
            commands::session::run(&load()?, &script)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
