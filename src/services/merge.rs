use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::domain::models::{OutputDefinition, OutputSection, RoleDocument, SectionType};

pub const DEFAULT_FILENAME_TEMPLATE: &str = "review_{subrole-or-role}_{timestamp}.md";

const TOKEN_PRIMARY_SLUG: &str = "{subrole-or-role}";
const TOKEN_TIMESTAMP: &str = "{timestamp}";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Append items not already present, preserving order of first occurrence.
/// Shared by guidance, fields, and item contributions.
pub fn append_unique<I>(existing: &mut Vec<String>, additions: I)
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashSet<String> = existing.iter().cloned().collect();
    for item in additions {
        if seen.insert(item.clone()) {
            existing.push(item);
        }
    }
}

/// Merge the output definitions of [top-level, sub-roles...] into one.
///
/// Sections are identified by normalized key. The first definition of a
/// section fixes its type and position; later contributions append under
/// first-occurrence-only dedup. A type mismatch never merges fields; it
/// records one conflict note in the existing section's guidance instead.
pub fn merge_output_definitions(
    top_role: &RoleDocument,
    sub_roles: &[RoleDocument],
) -> OutputDefinition {
    let mut merged: Vec<OutputSection> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for role in std::iter::once(top_role).chain(sub_roles.iter()) {
        for section in &role.output.sections {
            let normalized = section.normalized_key();
            let Some(&index) = index_by_key.get(&normalized) else {
                index_by_key.insert(normalized, merged.len());
                merged.push(section.clone());
                continue;
            };

            let current = &mut merged[index];
            if current.section_type != section.section_type {
                let note = format!(
                    "Conflict detected: section type mismatch encountered during merge; kept '{}' from first definition.",
                    current.section_type
                );
                append_unique(&mut current.guidance, [note]);
                continue;
            }

            append_unique(&mut current.guidance, section.guidance.iter().cloned());
            if current.section_type == SectionType::List {
                append_unique(&mut current.fields, section.fields.iter().cloned());
                append_unique(
                    &mut current.item_contributions,
                    section.item_contributions.iter().cloned(),
                );
            }
        }
    }

    let filename_template = sub_roles
        .iter()
        .find_map(|role| {
            role.output
                .filename_template
                .clone()
                .filter(|template| !template.is_empty())
        })
        .or_else(|| top_role.output.filename_template.clone());

    OutputDefinition {
        filename_template,
        sections: merged,
    }
}

/// Resolve the output filename: explicit path override, then configured
/// filename, then the merged template, then the built-in default. Empty
/// values fall through to the next tier; this never fails.
pub fn resolve_output_filename(
    output_override: Option<&Path>,
    config_output_filename: Option<&str>,
    merged_output: &OutputDefinition,
    top_role: &RoleDocument,
    sub_roles: &[RoleDocument],
    now: DateTime<Utc>,
) -> String {
    if let Some(name) = output_override
        .and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
    {
        return name;
    }

    if let Some(name) = config_output_filename.filter(|name| !name.is_empty()) {
        return name.to_string();
    }

    let template = merged_output
        .filename_template
        .as_deref()
        .filter(|template| !template.is_empty())
        .unwrap_or(DEFAULT_FILENAME_TEMPLATE);

    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    let primary_slug = sub_roles
        .first()
        .map(|role| role.slug.as_str())
        .unwrap_or(&top_role.slug);

    template
        .replace(TOKEN_PRIMARY_SLUG, primary_slug)
        .replace(TOKEN_TIMESTAMP, &timestamp)
}
