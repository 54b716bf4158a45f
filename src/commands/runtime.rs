use chrono::Utc;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::commands::{confirm, read_stdin_line, AppContext};
use crate::domain::errors::RoleError;
use crate::domain::models::{
    AssembleReport, PromoteReport, ReviewChange, ReviewSummary, RoleKind, RoleListItem,
    Scope,
};
use crate::services::config::{
    config_path, load_config, AppConfig, DEFAULT_OUTPUT_DIR, DEFAULT_PROJECT_ROLES_DIR,
};
use crate::services::merge::{merge_output_definitions, resolve_output_filename};
use crate::services::output::{print_lines, print_one, print_out};
use crate::services::parser::parse_role_file;
use crate::services::render::{render_assembled_role, write_assembled_role};
use crate::services::review::{
    apply_change_with_result, load_review_changes, stub_review_changes,
};
use crate::services::diffing;
use crate::services::storage::{audit, content_digest};
use crate::services::store::RoleStore;

pub fn handle_runtime_commands(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &cli.command {
        Commands::List { scope, kind } => {
            let cfg = optional_config(ctx, None)?;
            let roles = store_for(ctx, cfg.as_ref()).list(scope.to_scope(), kind.to_kind())?;
            let items: Vec<RoleListItem> = roles
                .into_iter()
                .map(|role| RoleListItem {
                    scope: role.source_scope,
                    kind: role.kind,
                    slug: role.slug,
                    name: role.name,
                    path: role.source_path.to_string_lossy().into_owned(),
                })
                .collect();
            print_out(ctx.json, &items, |r| {
                format!("{}\t{}\t{}\t{}\t{}", r.scope, r.kind, r.slug, r.name, r.path)
            })?;
        }
        Commands::Assemble {
            config,
            user_role,
            roles,
            name,
            output,
        } => {
            handle_assemble(
                ctx,
                config.as_deref(),
                user_role.as_deref(),
                roles,
                name.as_deref(),
                output.as_deref(),
            )?;
        }
        Commands::Diff { role, role_path } => {
            let cfg = optional_config(ctx, None)?;
            let store = store_for(ctx, cfg.as_ref());
            let (kind, slug) =
                resolve_role_target(&store, role.as_deref(), role_path.as_deref(), false)?;

            let project_role = store.project_role(kind, &slug)?;
            let user_role = store.user_role(kind, &slug)?;
            let before = std::fs::read_to_string(&user_role.source_path)?;
            let after = std::fs::read_to_string(&project_role.source_path)?;

            let diff = diffing::build_unified_diff(
                &before,
                &after,
                &user_role.source_path.to_string_lossy(),
                &project_role.source_path.to_string_lossy(),
            );
            print_lines(ctx.json, &diff, "No differences found.")?;
        }
        Commands::Promote {
            role,
            role_path,
            yes,
        } => {
            let cfg = optional_config(ctx, None)?;
            let store = store_for(ctx, cfg.as_ref());
            let (kind, slug) =
                resolve_role_target(&store, role.as_deref(), role_path.as_deref(), true)?;

            let project_role = store.project_role(kind, &slug)?;
            let destination = store.user_role_path(kind, &slug);

            let should_write = *yes
                || confirm(
                    &format!("Overwrite user-level role at {}?", destination.display()),
                    false,
                );
            if !should_write {
                print_one(ctx.json, "cancelled", |_| "promotion cancelled".to_string())?;
                return Ok(());
            }

            let content = std::fs::read_to_string(&project_role.source_path)?;
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&destination, &content)?;
            audit(
                &ctx.user_home,
                "promote",
                serde_json::json!({
                    "kind": kind,
                    "slug": &slug,
                    "destination": destination.to_string_lossy(),
                    "sha256": content_digest(&content),
                }),
            );

            let report = PromoteReport {
                kind,
                slug,
                destination: destination.to_string_lossy().into_owned(),
            };
            print_one(ctx.json, report, |r| {
                format!("promoted {}:{} -> {}", r.kind, r.slug, r.destination)
            })?;
        }
        Commands::Review {
            target_sub_roles,
            changes_file,
            use_stub,
            yes,
        } => {
            handle_review(ctx, target_sub_roles, changes_file.as_deref(), *use_stub, *yes)?;
        }
        Commands::Setup { .. } => unreachable!("handled by the setup command handler"),
    }

    Ok(())
}

fn handle_assemble(
    ctx: &AppContext,
    config: Option<&Path>,
    user_role: Option<&str>,
    roles: &[String],
    name: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let cfg = optional_config(ctx, config)?;
    let output_dir = cfg
        .as_ref()
        .map(|c| c.paths.output_dir.clone())
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

    let mut config_output_filename: Option<String> = None;
    let requested_roles: Vec<String>;
    let user_role_name: String;

    if !roles.is_empty() {
        requested_roles = roles.to_vec();
        user_role_name = name
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("{}-ad-hoc", requested_roles[0]));
    } else {
        let cfg = cfg.as_ref().ok_or_else(|| {
            RoleError::Config("no config found and no --role values provided".to_string())
        })?;
        if cfg.user_roles.is_empty() {
            return Err(
                RoleError::Config("config has no [[user_roles]] entries".to_string()).into(),
            );
        }
        let selected = match user_role {
            Some(wanted) => cfg
                .user_roles
                .iter()
                .find(|entry| entry.name == wanted)
                .ok_or_else(|| {
                    RoleError::Config(format!("user role not found in config: {wanted}"))
                })?,
            None => {
                if cfg.user_roles.len() != 1 {
                    return Err(RoleError::Config(
                        "multiple user roles in config; choose one with --user-role".to_string(),
                    )
                    .into());
                }
                &cfg.user_roles[0]
            }
        };

        if selected.uses_legacy_shape() {
            eprintln!("config uses legacy top_level_role/sub_roles; migrate to the 'roles' list");
        }
        requested_roles = selected.resolved_roles();
        if requested_roles.is_empty() {
            return Err(
                RoleError::Config("selected user role has no roles configured".to_string()).into(),
            );
        }
        config_output_filename = selected.output_filename.clone();
        user_role_name = selected.name.clone();
    }

    let store = store_for(ctx, cfg.as_ref());
    let (top_role, sub_roles) = store.resolve_chain(&requested_roles)?;
    let merged_output = merge_output_definitions(&top_role, &sub_roles);
    let content = render_assembled_role(&user_role_name, &top_role, &sub_roles, &merged_output);

    let destination = match output {
        Some(path) => {
            let destination = if path.is_absolute() {
                path.to_path_buf()
            } else {
                ctx.project_root.join(path)
            };
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&destination, &content)?;
            destination
        }
        None => {
            let filename = resolve_output_filename(
                None,
                config_output_filename.as_deref(),
                &merged_output,
                &top_role,
                &sub_roles,
                Utc::now(),
            );
            write_assembled_role(&content, &ctx.project_root.join(&output_dir), &filename)?
        }
    };

    let sub_role_slugs: Vec<String> = sub_roles.iter().map(|r| r.slug.clone()).collect();
    audit(
        &ctx.user_home,
        "assemble",
        serde_json::json!({
            "output": destination.to_string_lossy(),
            "top_level": &top_role.slug,
            "sub_roles": &sub_role_slugs,
            "sha256": content_digest(&content),
        }),
    );

    let report = AssembleReport {
        output: destination.to_string_lossy().into_owned(),
        top_level: top_role.slug.clone(),
        top_level_scope: top_role.source_scope,
        sub_roles: sub_role_slugs,
    };
    print_one(ctx.json, report, |r| {
        let sub_roles = if r.sub_roles.is_empty() {
            "(none)".to_string()
        } else {
            r.sub_roles.join(", ")
        };
        format!(
            "output: {}\ntop-level: {}\nsub-roles: {}",
            r.output, r.top_level, sub_roles
        )
    })?;
    Ok(())
}

fn handle_review(
    ctx: &AppContext,
    targets: &[String],
    changes_file: Option<&Path>,
    use_stub: bool,
    yes: bool,
) -> anyhow::Result<()> {
    if targets.is_empty() {
        return Err(
            RoleError::Config("provide at least one --target-sub-role".to_string()).into(),
        );
    }

    let changes = match changes_file {
        Some(path) => load_review_changes(path)?,
        None if use_stub => stub_review_changes(targets),
        None => {
            return Err(
                RoleError::Config("provide --changes-file or pass --use-stub".to_string()).into(),
            )
        }
    };

    let cfg = optional_config(ctx, None)?;
    let store = store_for(ctx, cfg.as_ref());

    let mut bodies: BTreeMap<String, String> = BTreeMap::new();
    let mut paths: BTreeMap<String, PathBuf> = BTreeMap::new();
    for slug in targets {
        let role = store.project_role(RoleKind::SubRole, slug)?;
        bodies.insert(slug.clone(), std::fs::read_to_string(&role.source_path)?);
        paths.insert(slug.clone(), role.source_path.clone());
    }

    let mut summary = ReviewSummary {
        accepted_applied: 0,
        accepted_noop: 0,
        rejected: 0,
        skipped: 0,
        failed: 0,
        files_written: 0,
    };
    let mut written: Vec<String> = Vec::new();
    let mut accept_all = yes;

    for (index, change) in changes.iter().enumerate() {
        if !ctx.json {
            print_change_preview(change);
        }

        // A bad change is contained: report it and keep going, leaving
        // earlier applied changes intact.
        if change.target_kind != RoleKind::SubRole {
            summary.failed += 1;
            if !ctx.json {
                println!("cannot apply: {}", RoleError::ForbiddenTarget);
            }
            continue;
        }
        let Some(body) = bodies.get_mut(&change.target_slug) else {
            summary.failed += 1;
            if !ctx.json {
                println!(
                    "cannot apply: target '{}' is not in --target-sub-role",
                    change.target_slug
                );
            }
            continue;
        };

        let action = if accept_all {
            'y'
        } else {
            prompt_change_action()
        };
        match action {
            'q' => {
                summary.skipped += changes.len() - index;
                break;
            }
            'n' => {
                summary.rejected += 1;
                continue;
            }
            'a' => accept_all = true,
            _ => {}
        }

        match apply_change_with_result(body, change) {
            Ok(result) if result.applied => {
                *body = result.content;
                if !written.contains(&change.target_slug) {
                    written.push(change.target_slug.clone());
                }
                summary.accepted_applied += 1;
            }
            Ok(result) => {
                summary.accepted_noop += 1;
                if !ctx.json {
                    if let Some(message) = result.message {
                        println!("{message} for {}", change.target_slug);
                    }
                }
            }
            Err(error) => {
                summary.failed += 1;
                if !ctx.json {
                    println!("cannot apply: {error}");
                }
            }
        }
    }

    written.sort();
    for slug in &written {
        let (Some(path), Some(body)) = (paths.get(slug), bodies.get(slug)) else {
            continue;
        };
        std::fs::write(path, body)?;
        audit(
            &ctx.user_home,
            "review_write",
            serde_json::json!({
                "slug": slug,
                "path": path.to_string_lossy(),
                "sha256": content_digest(body),
            }),
        );
    }
    summary.files_written = written.len();

    print_one(ctx.json, summary, |s| {
        format!(
            "accepted_applied: {}\naccepted_noop: {}\nrejected: {}\nskipped: {}\nfailed: {}\nfiles written: {}",
            s.accepted_applied, s.accepted_noop, s.rejected, s.skipped, s.failed, s.files_written
        )
    })?;
    Ok(())
}

fn print_change_preview(change: &ReviewChange) {
    println!(
        "proposed change: {}:{} [{}]",
        change.target_kind, change.target_slug, change.op
    );
    if let Some(anchor) = &change.anchor {
        println!("  anchor: {anchor}");
    }
    if let Some(text) = &change.text {
        println!("  text: {text}");
    }
    if let Some(old_text) = &change.old_text {
        println!("  old_text: {old_text}");
    }
    if let Some(new_text) = &change.new_text {
        println!("  new_text: {new_text}");
    }
}

fn prompt_change_action() -> char {
    loop {
        eprint!("Action [y=accept, n=reject, a=accept all remaining, q=quit] ");
        let _ = std::io::stderr().flush();
        let Some(answer) = read_stdin_line() else {
            return 'q';
        };
        match answer.to_ascii_lowercase().as_str() {
            "" | "y" => return 'y',
            "n" => return 'n',
            "a" => return 'a',
            "q" => return 'q',
            _ => continue,
        }
    }
}

/// Load the config when present: explicit paths must exist, the default
/// project path is optional.
fn optional_config(
    ctx: &AppContext,
    explicit: Option<&Path>,
) -> Result<Option<AppConfig>, RoleError> {
    match explicit {
        Some(path) => load_config(path).map(Some),
        None => {
            let candidate = config_path(&ctx.project_root);
            if candidate.exists() {
                load_config(&candidate).map(Some)
            } else {
                Ok(None)
            }
        }
    }
}

fn store_for(ctx: &AppContext, cfg: Option<&AppConfig>) -> RoleStore {
    let project_roles_dir = cfg
        .map(|c| c.paths.project_roles_dir.clone())
        .unwrap_or_else(|| DEFAULT_PROJECT_ROLES_DIR.to_string());
    RoleStore::new(
        ctx.project_root.clone(),
        ctx.user_home.clone(),
        project_roles_dir,
    )
}

/// Resolve the target (kind, slug) from a slug or an explicit role file.
/// Promote infers kinds from project scope only.
fn resolve_role_target(
    store: &RoleStore,
    role: Option<&str>,
    role_path: Option<&Path>,
    for_promote: bool,
) -> Result<(RoleKind, String), RoleError> {
    match (role, role_path) {
        (None, None) => Err(RoleError::Config(
            "provide --role or --role-path".to_string(),
        )),
        (Some(_), Some(_)) => Err(RoleError::Config(
            "provide either --role or --role-path, not both".to_string(),
        )),
        (None, Some(path)) => {
            let parsed = parse_role_file(path, Scope::Project)?;
            Ok((parsed.kind, parsed.slug))
        }
        (Some(slug), None) => {
            let kind = if for_promote {
                store.infer_project_kind(slug)?
            } else {
                store.infer_kind(slug)?
            };
            Ok((kind, slug.to_string()))
        }
    }
}
