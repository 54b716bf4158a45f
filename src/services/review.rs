use serde::Deserialize;
use std::path::Path;

use crate::domain::errors::RoleError;
use crate::domain::models::{ChangeOp, ReviewChange, RoleKind};

/// Outcome of attempting one review change against a role body.
#[derive(Debug)]
pub struct ChangeApplyResult {
    pub content: String,
    pub applied: bool,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct ChangesFile {
    #[serde(default)]
    changes: Vec<RawChange>,
}

#[derive(Deserialize)]
struct RawChange {
    target_kind: RoleKind,
    target_slug: String,
    op: ChangeOp,
    anchor: Option<String>,
    text: Option<String>,
    old_text: Option<String>,
    new_text: Option<String>,
}

/// Load proposed review changes from a TOML `[[changes]]` file. Every record
/// passes the construction-time validation before it reaches the engine.
pub fn load_review_changes(path: &Path) -> Result<Vec<ReviewChange>, RoleError> {
    let raw = std::fs::read_to_string(path)?;
    let parsed: ChangesFile = toml::from_str(&raw).map_err(|error| {
        RoleError::InvalidChange(format!("{}: {}", path.display(), error.message()))
    })?;

    parsed
        .changes
        .into_iter()
        .map(|change| {
            ReviewChange::new(
                change.target_kind,
                change.target_slug,
                change.op,
                change.anchor,
                change.text,
                change.old_text,
                change.new_text,
            )
        })
        .collect()
}

/// Deterministic placeholder changes for driving the approval flow without
/// a changes file.
pub fn stub_review_changes(target_sub_roles: &[String]) -> Vec<ReviewChange> {
    target_sub_roles
        .iter()
        .map(|target| ReviewChange {
            target_kind: RoleKind::SubRole,
            target_slug: target.clone(),
            op: ChangeOp::Add,
            anchor: Some("## Evaluation Areas".to_string()),
            text: Some(
                "- Add explicit acceptance-criteria checks for each reported issue.".to_string(),
            ),
            old_text: None,
            new_text: None,
        })
        .collect()
}

/// Apply one change to a role body. Exact substring matching only; each
/// operation is idempotent. Top-level targets are always rejected.
pub fn apply_change(content: &str, change: &ReviewChange) -> Result<(String, bool), RoleError> {
    if change.target_kind != RoleKind::SubRole {
        return Err(RoleError::ForbiddenTarget);
    }

    match change.op {
        ChangeOp::Add => apply_add(content, change),
        ChangeOp::Remove => apply_remove(content, change),
        ChangeOp::Modify => apply_modify(content, change),
    }
}

/// Apply one change and attach a no-op reason when nothing was done.
pub fn apply_change_with_result(
    content: &str,
    change: &ReviewChange,
) -> Result<ChangeApplyResult, RoleError> {
    let (new_content, applied) = apply_change(content, change)?;
    if applied {
        return Ok(ChangeApplyResult {
            content: new_content,
            applied: true,
            message: None,
        });
    }

    let message = no_op_message(change, content);
    Ok(ChangeApplyResult {
        content: new_content,
        applied: false,
        message: Some(message),
    })
}

fn no_op_message(change: &ReviewChange, original_content: &str) -> String {
    match change.op {
        ChangeOp::Remove | ChangeOp::Modify => "no-op (target text not found)".to_string(),
        ChangeOp::Add => {
            let anchor_missing = change
                .anchor
                .as_deref()
                .is_some_and(|anchor| !anchor.is_empty() && !original_content.contains(anchor));
            if anchor_missing {
                "no-op (anchor not found; text already present)".to_string()
            } else {
                "no-op (text already present)".to_string()
            }
        }
    }
}

fn apply_add(content: &str, change: &ReviewChange) -> Result<(String, bool), RoleError> {
    let text = change
        .text
        .as_deref()
        .ok_or_else(|| RoleError::InvalidChange("add operation requires text".to_string()))?;
    let text_to_add = text.trim();

    let anchor = change
        .anchor
        .as_deref()
        .filter(|anchor| !anchor.is_empty() && content.contains(*anchor));

    if let Some(anchor) = anchor {
        let anchor_end = content.find(anchor).unwrap_or_default() + anchor.len();
        let trailing = &content[anchor_end..];
        let insertion = format!("\n{text_to_add}");
        if trailing.starts_with(&insertion) {
            return Ok((content.to_string(), false));
        }
        return Ok((
            format!("{}{}{}", &content[..anchor_end], insertion, trailing),
            true,
        ));
    }

    let trimmed = content.trim_end();
    if trimmed.contains(text_to_add) {
        return Ok((content.to_string(), false));
    }
    Ok((format!("{trimmed}\n\n{text_to_add}\n"), true))
}

fn apply_remove(content: &str, change: &ReviewChange) -> Result<(String, bool), RoleError> {
    let text = change
        .text
        .as_deref()
        .ok_or_else(|| RoleError::InvalidChange("remove operation requires text".to_string()))?;
    if !content.contains(text) {
        return Ok((content.to_string(), false));
    }
    Ok((content.replacen(text, "", 1), true))
}

fn apply_modify(content: &str, change: &ReviewChange) -> Result<(String, bool), RoleError> {
    let (Some(old_text), Some(new_text)) = (change.old_text.as_deref(), change.new_text.as_deref())
    else {
        return Err(RoleError::InvalidChange(
            "modify operation requires old_text and new_text".to_string(),
        ));
    };
    if !content.contains(old_text) {
        return Ok((content.to_string(), false));
    }
    Ok((content.replacen(old_text, new_text, 1), true))
}
