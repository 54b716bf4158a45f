use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::models::{RoleKind, Scope};

#[derive(Parser, Debug)]
#[command(name = "rolekit", version, about = "Layered role prompt assembly CLI")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(long, global = true, help = "Project root directory")]
    pub project_root: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "User data home (defaults to ROLEKIT_HOME or ~/.rolekit)"
    )]
    pub user_home: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List roles across builtin/user/project scopes.
    List {
        #[arg(long, value_enum, default_value_t = ScopeFilter::All)]
        scope: ScopeFilter,
        #[arg(long, value_enum, default_value_t = KindFilter::All)]
        kind: KindFilter,
    },
    /// Assemble a composite user role artifact.
    Assemble {
        #[arg(long, help = "Config path (defaults to <project-root>/rolekit.toml)")]
        config: Option<PathBuf>,
        #[arg(long, help = "Named user role from config")]
        user_role: Option<String>,
        #[arg(long = "role", help = "Role slug (repeat flag for ad-hoc mode)")]
        roles: Vec<String>,
        #[arg(long, help = "Assembled role name (ad-hoc mode)")]
        name: Option<String>,
        #[arg(long, help = "Output file path override")]
        output: Option<PathBuf>,
    },
    /// Show the diff between the user-level and project-level role file.
    Diff {
        #[arg(long, help = "Role slug (kind inferred when possible)")]
        role: Option<String>,
        #[arg(long, help = "Explicit role file path used to infer kind and slug")]
        role_path: Option<PathBuf>,
    },
    /// Promote a project-local role to user level by overwrite.
    Promote {
        #[arg(long, help = "Project-local role slug (kind inferred)")]
        role: Option<String>,
        #[arg(long, help = "Explicit role file path used to infer kind and slug")]
        role_path: Option<PathBuf>,
        #[arg(long, default_value_t = false, help = "Skip confirmation prompt")]
        yes: bool,
    },
    /// Apply review changes to sub-role files with per-change approval.
    Review {
        #[arg(
            long = "target-sub-role",
            help = "Target sub-role slug for updates (repeat for multiple)"
        )]
        target_sub_roles: Vec<String>,
        #[arg(long, help = "TOML file with proposed changes")]
        changes_file: Option<PathBuf>,
        #[arg(
            long,
            default_value_t = false,
            help = "Use deterministic stub changes when --changes-file is not provided"
        )]
        use_stub: bool,
        #[arg(long, default_value_t = false, help = "Accept every change without prompting")]
        yes: bool,
    },
    /// Install/update the review skill and persist setup defaults.
    Setup {
        #[arg(long, value_enum, help = "Setup target agent")]
        agent: Option<SetupAgent>,
        #[arg(long, help = "Portable prompt output path for --agent none")]
        skill_dir: Option<PathBuf>,
        #[arg(long, help = "Codex skills root (defaults to CODEX_HOME/skills or ~/.codex/skills)")]
        codex_dir: Option<PathBuf>,
        #[arg(long, help = "Persisted user-home override for setup defaults")]
        home_dir: Option<PathBuf>,
        #[arg(long, default_value_t = false, help = "Overwrite existing install target")]
        force: bool,
        #[arg(long, default_value_t = false, help = "Skip confirmation prompts")]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScopeFilter {
    All,
    Builtin,
    User,
    Project,
}

impl ScopeFilter {
    pub fn to_scope(self) -> Option<Scope> {
        match self {
            ScopeFilter::All => None,
            ScopeFilter::Builtin => Some(Scope::Builtin),
            ScopeFilter::User => Some(Scope::User),
            ScopeFilter::Project => Some(Scope::Project),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum KindFilter {
    All,
    TopLevel,
    SubRole,
}

impl KindFilter {
    pub fn to_kind(self) -> Option<RoleKind> {
        match self {
            KindFilter::All => None,
            KindFilter::TopLevel => Some(RoleKind::TopLevel),
            KindFilter::SubRole => Some(RoleKind::SubRole),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SetupAgent {
    #[default]
    None,
    Codex,
}

impl SetupAgent {
    pub fn as_str(self) -> &'static str {
        match self {
            SetupAgent::None => "none",
            SetupAgent::Codex => "codex",
        }
    }
}
