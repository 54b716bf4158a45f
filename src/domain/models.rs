use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::domain::errors::RoleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleKind {
    TopLevel,
    SubRole,
}

impl RoleKind {
    pub const ALL: [RoleKind; 2] = [RoleKind::TopLevel, RoleKind::SubRole];

    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::TopLevel => "top-level",
            RoleKind::SubRole => "sub-role",
        }
    }

    /// Directory name holding files of this kind inside a scope root.
    pub fn dir_name(self) -> &'static str {
        match self {
            RoleKind::TopLevel => "top_level",
            RoleKind::SubRole => "sub_roles",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Text,
    List,
}

impl SectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Text => "text",
            SectionType::List => "list",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Add,
    Remove,
    Modify,
}

impl ChangeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeOp::Add => "add",
            ChangeOp::Remove => "remove",
            ChangeOp::Modify => "modify",
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a resolved role file. Identity is (kind, slug); scope only
/// records where the winning file came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Builtin,
    User,
    Project,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Builtin => "builtin",
            Scope::User => "user",
            Scope::Project => "project",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputSection {
    pub key: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub guidance: Vec<String>,
    pub fields: Vec<String>,
    pub item_contributions: Vec<String>,
}

impl OutputSection {
    /// Case-normalized key used as merge identity, never for display.
    pub fn normalized_key(&self) -> String {
        self.key.trim().to_lowercase()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OutputDefinition {
    pub filename_template: Option<String>,
    pub sections: Vec<OutputSection>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoleDocument {
    pub kind: RoleKind,
    pub name: String,
    pub slug: String,
    pub version: String,
    pub depends_on_top_level: Option<String>,
    pub output: OutputDefinition,
    pub body: String,
    pub source_scope: Scope,
    pub source_path: PathBuf,
}

impl RoleDocument {
    /// Validating constructor: a sub-role without a non-empty top-level
    /// dependency must never exist as a value.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: RoleKind,
        name: String,
        slug: String,
        version: String,
        depends_on_top_level: Option<String>,
        output: OutputDefinition,
        body: String,
        source_scope: Scope,
        source_path: PathBuf,
    ) -> Result<Self, RoleError> {
        let depends_on_top_level = depends_on_top_level
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if kind == RoleKind::SubRole && depends_on_top_level.is_none() {
            return Err(RoleError::MissingDependencyMetadata(slug));
        }

        Ok(Self {
            kind,
            name,
            slug,
            version,
            depends_on_top_level,
            output,
            body,
            source_scope,
            source_path,
        })
    }
}

/// One declarative edit against a sub-role body.
#[derive(Clone, Debug)]
pub struct ReviewChange {
    pub target_kind: RoleKind,
    pub target_slug: String,
    pub op: ChangeOp,
    pub anchor: Option<String>,
    pub text: Option<String>,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
}

impl ReviewChange {
    /// Validating constructor enforcing the op-specific field rules; an
    /// invalid change must never exist as a value.
    pub fn new(
        target_kind: RoleKind,
        target_slug: String,
        op: ChangeOp,
        anchor: Option<String>,
        text: Option<String>,
        old_text: Option<String>,
        new_text: Option<String>,
    ) -> Result<Self, RoleError> {
        if target_slug.is_empty() {
            return Err(RoleError::InvalidChange(
                "'target_slug' must be a non-empty string".to_string(),
            ));
        }

        match op {
            ChangeOp::Add | ChangeOp::Remove => {
                if text.as_deref().unwrap_or_default().is_empty() {
                    return Err(RoleError::InvalidChange(format!(
                        "'text' is required for {op} operations"
                    )));
                }
            }
            ChangeOp::Modify => {
                if old_text.as_deref().unwrap_or_default().is_empty() || new_text.is_none() {
                    return Err(RoleError::InvalidChange(
                        "'old_text' and 'new_text' are required for modify operations"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            target_kind,
            target_slug,
            op,
            anchor,
            text,
            old_text,
            new_text,
        })
    }
}

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonErr {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct RoleListItem {
    pub scope: Scope,
    pub kind: RoleKind,
    pub slug: String,
    pub name: String,
    pub path: String,
}

#[derive(Serialize)]
pub struct AssembleReport {
    pub output: String,
    pub top_level: String,
    pub top_level_scope: Scope,
    pub sub_roles: Vec<String>,
}

#[derive(Serialize)]
pub struct PromoteReport {
    pub kind: RoleKind,
    pub slug: String,
    pub destination: String,
}

#[derive(Serialize)]
pub struct ReviewSummary {
    pub accepted_applied: usize,
    pub accepted_noop: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files_written: usize,
}

#[derive(Serialize)]
pub struct SetupReport {
    pub agent: String,
    pub destination: String,
    pub status: String,
    pub sha256: String,
}
