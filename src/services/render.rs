use std::path::{Path, PathBuf};

use crate::domain::errors::RoleError;
use crate::domain::models::{OutputDefinition, RoleDocument, SectionType};

/// Render the assembled user role artifact: composition header, resolved
/// output definition, then the instruction bodies in chain order.
pub fn render_assembled_role(
    user_role_name: &str,
    top_role: &RoleDocument,
    sub_roles: &[RoleDocument],
    merged_output: &OutputDefinition,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# User Role: {user_role_name}"));
    lines.push(String::new());
    lines.push("## Composition".to_string());
    lines.push(format!(
        "- Top-Level Role: `{}` ({})",
        top_role.slug, top_role.source_scope
    ));
    if sub_roles.is_empty() {
        lines.push("- Sub-Roles: (none)".to_string());
    } else {
        lines.push("- Sub-Roles:".to_string());
        for sub_role in sub_roles {
            lines.push(format!(
                "  - `{}` ({})",
                sub_role.slug, sub_role.source_scope
            ));
        }
    }
    lines.push(String::new());

    lines.push("## Resolved Output Definition".to_string());
    for section in &merged_output.sections {
        lines.push(String::new());
        lines.push(format!("### {} ({})", section.key, section.section_type));
        if !section.guidance.is_empty() {
            lines.push("- Guidance:".to_string());
            for guidance in &section.guidance {
                lines.push(format!("  - {guidance}"));
            }
        }
        if section.section_type == SectionType::List && !section.fields.is_empty() {
            lines.push("- Fields:".to_string());
            for field in &section.fields {
                lines.push(format!("  - {field}"));
            }
        }
        if section.section_type == SectionType::List && !section.item_contributions.is_empty() {
            lines.push("- Item Contributions:".to_string());
            for contribution in &section.item_contributions {
                lines.push(format!("  - {contribution}"));
            }
        }
    }

    lines.push(String::new());
    lines.push("## Instructions".to_string());
    lines.push(String::new());
    lines.push(format!("### Top-Level Role: {}", top_role.name));
    lines.push(top_role.body.trim_end().to_string());

    for sub_role in sub_roles {
        lines.push(String::new());
        lines.push(format!("### Sub-Role: {}", sub_role.name));
        lines.push(sub_role.body.trim_end().to_string());
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Write the assembled artifact and return its path.
pub fn write_assembled_role(
    content: &str,
    output_dir: &Path,
    filename: &str,
) -> Result<PathBuf, RoleError> {
    std::fs::create_dir_all(output_dir)?;
    let destination = output_dir.join(filename);
    std::fs::write(&destination, content)?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{OutputSection, RoleKind, Scope};

    fn role(kind: RoleKind, slug: &str, body: &str) -> RoleDocument {
        RoleDocument::new(
            kind,
            slug.to_string(),
            slug.to_string(),
            "1.0.0".to_string(),
            (kind == RoleKind::SubRole).then(|| "reviewer".to_string()),
            OutputDefinition::default(),
            body.to_string(),
            Scope::Project,
            PathBuf::from(format!("{slug}.md")),
        )
        .expect("valid role")
    }

    #[test]
    fn renders_composition_sections_and_bodies() {
        let top = role(RoleKind::TopLevel, "reviewer", "Top body.\n");
        let sub = role(RoleKind::SubRole, "code-review", "Sub body.\n");
        let merged = OutputDefinition {
            filename_template: None,
            sections: vec![OutputSection {
                key: "Issues".to_string(),
                section_type: SectionType::List,
                guidance: vec!["g1".to_string()],
                fields: vec!["severity".to_string()],
                item_contributions: vec!["c1".to_string()],
            }],
        };

        let content = render_assembled_role("daily-review", &top, &[sub], &merged);

        assert!(content.starts_with("# User Role: daily-review\n"));
        assert!(content.contains("- Top-Level Role: `reviewer` (project)"));
        assert!(content.contains("  - `code-review` (project)"));
        assert!(content.contains("### Issues (list)"));
        assert!(content.contains("- Fields:\n  - severity"));
        assert!(content.contains("### Sub-Role: code-review\nSub body."));
    }

    #[test]
    fn renders_placeholder_when_no_sub_roles() {
        let top = role(RoleKind::TopLevel, "reviewer", "Top body.\n");
        let content =
            render_assembled_role("solo", &top, &[], &OutputDefinition::default());
        assert!(content.contains("- Sub-Roles: (none)"));
    }
}
