use std::path::PathBuf;

/// Typed failures for role resolution, merging, and review patching.
///
/// Every variant is recoverable by the caller; `main` maps them onto the
/// JSON error contract via [`RoleError::code`].
#[derive(thiserror::Error, Debug)]
pub enum RoleError {
    #[error("role not found ({kind}): {slug}")]
    RoleNotFound { kind: String, slug: String },
    #[error("role slug '{0}' matches multiple role kinds; provide --role-path")]
    AmbiguousRole(String),
    #[error("requested roles resolve to conflicting top-level roles '{first}' and '{second}'")]
    ConflictingTopLevel { first: String, second: String },
    #[error("sub-role '{0}' is missing its top-level dependency metadata")]
    MissingDependencyMetadata(String),
    #[error("could not resolve a top-level role from the requested roles")]
    NoTopLevelRole,
    #[error("review changes may only target sub-role files")]
    ForbiddenTarget,
    #[error("invalid review change: {0}")]
    InvalidChange(String),
    #[error("cannot parse role file {path}: {message}")]
    RoleParse { path: PathBuf, message: String },
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RoleError {
    /// Stable machine-readable code for the JSON error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            RoleError::RoleNotFound { .. } => "ROLE_NOT_FOUND",
            RoleError::AmbiguousRole(_) => "AMBIGUOUS_ROLE",
            RoleError::ConflictingTopLevel { .. } => "CONFLICTING_TOP_LEVEL",
            RoleError::MissingDependencyMetadata(_) => "MISSING_DEPENDENCY_METADATA",
            RoleError::NoTopLevelRole => "NO_TOP_LEVEL_ROLE",
            RoleError::ForbiddenTarget => "FORBIDDEN_TARGET",
            RoleError::InvalidChange(_) => "INVALID_CHANGE",
            RoleError::RoleParse { .. } => "ROLE_PARSE",
            RoleError::Config(_) => "CONFIG",
            RoleError::Io(_) => "IO",
        }
    }
}
