use std::path::{Path, PathBuf};

use crate::cli::SetupAgent;
use crate::domain::errors::RoleError;
use crate::services::config::SetupConfig;

const TEMPLATE_VERSION: &str = "1";
const TEMPLATE_TIMESTAMP: &str = "2026-08-01T00:00:00Z";
const SKILL_ID: &str = "rolekit-review-skill";
const CODEX_SKILL_NAME: &str = "rolekit-review";
const PORTABLE_PROMPT_FILENAME: &str = "rolekit_review_skill.md";

/// Result of one setup write operation.
pub struct SetupResult {
    pub destination: PathBuf,
    pub action: &'static str,
    pub content: String,
}

/// Resolve the codex skills root: explicit flag, then CODEX_HOME, then
/// ~/.codex/skills.
pub fn resolve_codex_skills_dir(codex_dir: Option<&Path>) -> Result<PathBuf, RoleError> {
    if let Some(dir) = codex_dir {
        return Ok(dir.to_path_buf());
    }
    if let Ok(home) = std::env::var("CODEX_HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home).join("skills"));
        }
    }
    let home = std::env::var("HOME")
        .map_err(|_| RoleError::Config("HOME is not set; pass --codex-dir".to_string()))?;
    Ok(PathBuf::from(home).join(".codex").join("skills"))
}

pub fn default_portable_prompt_path(project_root: &Path) -> PathBuf {
    project_root.join(PORTABLE_PROMPT_FILENAME)
}

/// Portable review prompt installed for `--agent none`.
pub fn render_portable_prompt() -> String {
    [
        &format!("rolekit_skill_id: {SKILL_ID}") as &str,
        &format!("rolekit_template_version: {TEMPLATE_VERSION}"),
        &format!("rolekit_template_timestamp: {TEMPLATE_TIMESTAMP}"),
        "",
        "# Review Skill",
        "",
        "Use this workflow to generate review changes for role files.",
        "",
        "## Inputs",
        "- Active assembled user role",
        "- Conversation context and user feedback",
        "- Target sub-role slugs",
        "",
        "## Output format",
        "Produce TOML with `[[changes]]` entries:",
        "- `target_kind = \"sub-role\"`",
        "- `target_slug = \"...\"`",
        "- `op = \"add\"|\"remove\"|\"modify\"`",
        "- `anchor`, `text`, `old_text`, `new_text` as required by op",
        "",
        "## Constraints",
        "- Never target top-level roles.",
        "- Prefer minimal, deterministic text edits.",
        "- Keep suggestions concrete and verifiable.",
        "",
    ]
    .join("\n")
}

/// Codex SKILL.md for the review workflow.
pub fn render_codex_skill() -> String {
    [
        "---",
        &format!("name: {CODEX_SKILL_NAME}") as &str,
        "description: Generate deterministic review changes in TOML for review --changes-file.",
        "---",
        "",
        &format!("rolekit_skill_id: {SKILL_ID}"),
        &format!("rolekit_template_version: {TEMPLATE_VERSION}"),
        &format!("rolekit_template_timestamp: {TEMPLATE_TIMESTAMP}"),
        "",
        "# Review",
        "",
        "Generate `[[changes]]` TOML entries for sub-role updates.",
        "",
        "Required behavior:",
        "- Only emit `target_kind = \"sub-role\"`.",
        "- Keep changes minimal and deterministic.",
        "- Prefer `modify` over broad `remove`+`add` when possible.",
        "- Include exact anchor/text values that can be applied safely.",
        "",
    ]
    .join("\n")
}

fn extract_metadata(content: &str) -> (Option<&str>, Option<&str>, Option<&str>) {
    let mut skill_id = None;
    let mut version = None;
    let mut timestamp = None;
    for line in content.lines() {
        if let Some(value) = line.strip_prefix("rolekit_skill_id:") {
            skill_id = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("rolekit_template_version:") {
            version = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("rolekit_template_timestamp:") {
            timestamp = Some(value.trim());
        }
    }
    (skill_id, version, timestamp)
}

/// Whether the destination should be overwritten: forced, absent, or
/// carrying a different metadata triple than the rendered content.
pub fn needs_update(destination: &Path, content: &str, force: bool) -> Result<bool, RoleError> {
    if force || !destination.exists() {
        return Ok(true);
    }
    let existing = std::fs::read_to_string(destination)?;
    Ok(extract_metadata(&existing) != extract_metadata(content))
}

/// Write the file when missing or outdated; report what happened.
pub fn write_if_needed(
    destination: PathBuf,
    content: String,
    force: bool,
) -> Result<SetupResult, RoleError> {
    let existed = destination.exists();
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if needs_update(&destination, &content, force)? {
        std::fs::write(&destination, &content)?;
        let action = if existed { "updated" } else { "installed" };
        return Ok(SetupResult {
            destination,
            action,
            content,
        });
    }
    Ok(SetupResult {
        destination,
        action: "up-to-date",
        content,
    })
}

/// Install the portable prompt file for `--agent none`.
pub fn install_portable_prompt(
    project_root: &Path,
    skill_dir: Option<&Path>,
    force: bool,
) -> Result<SetupResult, RoleError> {
    let destination = match skill_dir {
        None => default_portable_prompt_path(project_root),
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => project_root.join(dir),
    };
    write_if_needed(destination, render_portable_prompt(), force)
}

/// Install or refresh the codex skill file.
pub fn install_codex_skill(codex_dir: Option<&Path>, force: bool) -> Result<SetupResult, RoleError> {
    let root = resolve_codex_skills_dir(codex_dir)?;
    let destination = root.join(CODEX_SKILL_NAME).join("SKILL.md");
    write_if_needed(destination, render_codex_skill(), force)
}

/// Merge explicit setup overrides over the persisted defaults.
pub fn merged_setup_config(
    existing: &SetupConfig,
    agent: SetupAgent,
    skill_dir: Option<&Path>,
    codex_dir: Option<&Path>,
    home_dir: Option<&Path>,
) -> SetupConfig {
    let as_string = |path: &Path| path.to_string_lossy().into_owned();
    SetupConfig {
        agent,
        skill_dir: skill_dir.map(as_string).or_else(|| existing.skill_dir.clone()),
        codex_dir: codex_dir.map(as_string).or_else(|| existing.codex_dir.clone()),
        home_dir: home_dir.map(as_string).or_else(|| existing.home_dir.clone()),
    }
}
