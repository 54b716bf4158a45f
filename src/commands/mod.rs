//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `admin.rs` — setup command.
//! - `runtime.rs` — list/assemble/diff/promote/review.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Keep behavior and output schema stable.

use std::io::Write;
use std::path::PathBuf;

use crate::cli::Cli;

pub mod admin;
pub mod runtime;

pub use admin::handle_setup_commands;
pub use runtime::handle_runtime_commands;

/// Shared per-invocation context resolved once from global flags.
pub struct AppContext {
    pub project_root: PathBuf,
    pub user_home: PathBuf,
    pub json: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let project_root = cli
            .project_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let project_root = std::fs::canonicalize(&project_root).unwrap_or(project_root);
        Ok(Self {
            project_root,
            user_home: resolve_user_home(cli.user_home.clone())?,
            json: cli.json,
        })
    }
}

/// Effective user data home: explicit flag, then ROLEKIT_HOME, then
/// ~/.rolekit.
pub fn resolve_user_home(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(env_home) = std::env::var("ROLEKIT_HOME") {
        if !env_home.is_empty() {
            return Ok(PathBuf::from(env_home));
        }
    }
    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home).join(".rolekit"))
}

/// Read one trimmed line from stdin; None at EOF.
pub fn read_stdin_line() -> Option<String> {
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Ask a yes/no question on stderr (stdout stays reserved for reports).
/// An empty answer takes the default.
pub fn confirm(question: &str, default: bool) -> bool {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    eprint!("{question} {hint} ");
    let _ = std::io::stderr().flush();
    match read_stdin_line() {
        None => default,
        Some(answer) if answer.is_empty() => default,
        Some(answer) => answer.eq_ignore_ascii_case("y"),
    }
}
