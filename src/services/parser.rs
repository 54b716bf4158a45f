use serde::Deserialize;
use std::path::Path;

use crate::domain::errors::RoleError;
use crate::domain::models::{
    OutputDefinition, OutputSection, RoleDocument, RoleKind, Scope, SectionType,
};

const FRONT_MATTER_FENCE: &str = "+++";

#[derive(Deserialize)]
struct FrontMatter {
    kind: RoleKind,
    name: String,
    slug: String,
    version: String,
    depends_on_top_level: Option<String>,
    #[serde(default)]
    output: FrontMatterOutput,
}

#[derive(Default, Deserialize)]
struct FrontMatterOutput {
    filename_template: Option<String>,
    #[serde(default)]
    sections: Vec<FrontMatterSection>,
}

#[derive(Deserialize)]
struct FrontMatterSection {
    key: String,
    #[serde(rename = "type")]
    section_type: SectionType,
    #[serde(default)]
    guidance: Vec<String>,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    item_contributions: Vec<String>,
}

fn parse_error(path: &Path, message: impl Into<String>) -> RoleError {
    RoleError::RoleParse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Split a role document into its TOML front matter and body. The file must
/// open with a `+++` fence line and contain a matching closing fence.
fn extract_front_matter<'a>(raw: &'a str, path: &Path) -> Result<(&'a str, &'a str), RoleError> {
    let rest = raw
        .strip_prefix(FRONT_MATTER_FENCE)
        .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
        .ok_or_else(|| parse_error(path, "role file must start with TOML front matter"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == FRONT_MATTER_FENCE {
            let front_matter = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((front_matter, body.trim_start_matches('\n')));
        }
        offset += line.len();
    }

    Err(parse_error(
        path,
        "role file is missing the closing front matter fence",
    ))
}

fn ensure_nonempty(key: &str, value: &str, path: &Path) -> Result<(), RoleError> {
    if value.trim().is_empty() {
        return Err(parse_error(
            path,
            format!("'{key}' must be a non-empty string"),
        ));
    }
    Ok(())
}

/// Parse one role document from raw text. Malformed input is a parse
/// failure, which callers must keep distinct from "file absent".
pub fn parse_role_str(raw: &str, scope: Scope, path: &Path) -> Result<RoleDocument, RoleError> {
    let (front_matter_text, body) = extract_front_matter(raw, path)?;

    let front_matter: FrontMatter =
        toml::from_str(front_matter_text).map_err(|error| parse_error(path, error.message()))?;

    ensure_nonempty("name", &front_matter.name, path)?;
    ensure_nonempty("slug", &front_matter.slug, path)?;
    ensure_nonempty("version", &front_matter.version, path)?;

    let mut sections = Vec::with_capacity(front_matter.output.sections.len());
    for section in front_matter.output.sections {
        ensure_nonempty("output.sections.key", &section.key, path)?;
        sections.push(OutputSection {
            key: section.key,
            section_type: section.section_type,
            guidance: section.guidance,
            fields: section.fields,
            item_contributions: section.item_contributions,
        });
    }

    let output = OutputDefinition {
        filename_template: front_matter.output.filename_template,
        sections,
    };

    RoleDocument::new(
        front_matter.kind,
        front_matter.name,
        front_matter.slug,
        front_matter.version,
        front_matter.depends_on_top_level,
        output,
        body.to_string(),
        scope,
        path.to_path_buf(),
    )
    .map_err(|error| match error {
        RoleError::MissingDependencyMetadata(slug) => parse_error(
            path,
            format!("'depends_on_top_level' must be a non-empty string for sub-role '{slug}'"),
        ),
        other => other,
    })
}

/// Parse a role file from disk.
pub fn parse_role_file(path: &Path, scope: Scope) -> Result<RoleDocument, RoleError> {
    let raw = std::fs::read_to_string(path)?;
    parse_role_str(&raw, scope, path)
}
