use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::errors::RoleError;
use crate::domain::models::{RoleDocument, RoleKind, Scope};
use crate::services::parser::{parse_role_file, parse_role_str};

struct BuiltinRole {
    kind: RoleKind,
    slug: &'static str,
    raw: &'static str,
}

const BUILTIN_ROLES: &[BuiltinRole] = &[
    BuiltinRole {
        kind: RoleKind::TopLevel,
        slug: "reviewer",
        raw: include_str!("../builtin/top_level/reviewer.md"),
    },
    BuiltinRole {
        kind: RoleKind::SubRole,
        slug: "code-review",
        raw: include_str!("../builtin/sub_roles/code-review.md"),
    },
    BuiltinRole {
        kind: RoleKind::SubRole,
        slug: "project-audit",
        raw: include_str!("../builtin/sub_roles/project-audit.md"),
    },
];

fn builtin_path(kind: RoleKind, slug: &str) -> PathBuf {
    PathBuf::from("builtin").join(kind.dir_name()).join(format!("{slug}.md"))
}

/// Role lookup across the three precedence-ordered scopes. Project and user
/// scopes are directories on disk; the builtin scope is compiled into the
/// binary. Lookups are read-only; nothing here writes role files.
pub struct RoleStore {
    project_root: PathBuf,
    user_home: PathBuf,
    project_roles_dir: String,
}

impl RoleStore {
    pub fn new(project_root: PathBuf, user_home: PathBuf, project_roles_dir: String) -> Self {
        Self {
            project_root,
            user_home,
            project_roles_dir,
        }
    }

    fn project_root_dir(&self) -> PathBuf {
        self.project_root.join(&self.project_roles_dir)
    }

    fn user_root_dir(&self) -> PathBuf {
        self.user_home.join("roles")
    }

    fn role_path(root: &Path, kind: RoleKind, slug: &str) -> PathBuf {
        root.join(kind.dir_name()).join(format!("{slug}.md"))
    }

    fn load_from_dir(
        root: &Path,
        scope: Scope,
        kind: RoleKind,
        slug: &str,
    ) -> Result<Option<RoleDocument>, RoleError> {
        let path = Self::role_path(root, kind, slug);
        if !path.exists() {
            return Ok(None);
        }
        parse_role_file(&path, scope).map(Some)
    }

    fn load_builtin(kind: RoleKind, slug: &str) -> Result<Option<RoleDocument>, RoleError> {
        let Some(entry) = BUILTIN_ROLES
            .iter()
            .find(|b| b.kind == kind && b.slug == slug)
        else {
            return Ok(None);
        };
        parse_role_str(entry.raw, Scope::Builtin, &builtin_path(kind, slug)).map(Some)
    }

    fn exists_in_scope(&self, scope: Scope, kind: RoleKind, slug: &str) -> bool {
        match scope {
            Scope::Project => Self::role_path(&self.project_root_dir(), kind, slug).exists(),
            Scope::User => Self::role_path(&self.user_root_dir(), kind, slug).exists(),
            Scope::Builtin => BUILTIN_ROLES
                .iter()
                .any(|b| b.kind == kind && b.slug == slug),
        }
    }

    /// Resolve (kind, slug) using project > user > builtin precedence. The
    /// first scope holding a file wins outright; scopes are never merged.
    pub fn resolve(&self, kind: RoleKind, slug: &str) -> Result<RoleDocument, RoleError> {
        if let Some(role) = Self::load_from_dir(&self.project_root_dir(), Scope::Project, kind, slug)?
        {
            return Ok(role);
        }
        if let Some(role) = Self::load_from_dir(&self.user_root_dir(), Scope::User, kind, slug)? {
            return Ok(role);
        }
        if let Some(role) = Self::load_builtin(kind, slug)? {
            return Ok(role);
        }
        Err(RoleError::RoleNotFound {
            kind: kind.to_string(),
            slug: slug.to_string(),
        })
    }

    /// Infer a slug's kind by probing every scope for each kind. Succeeds
    /// only when exactly one kind has a match anywhere.
    pub fn infer_kind(&self, slug: &str) -> Result<RoleKind, RoleError> {
        let matches: Vec<RoleKind> = RoleKind::ALL
            .into_iter()
            .filter(|&kind| {
                [Scope::Project, Scope::User, Scope::Builtin]
                    .into_iter()
                    .any(|scope| self.exists_in_scope(scope, kind, slug))
            })
            .collect();

        match matches.as_slice() {
            [] => Err(RoleError::RoleNotFound {
                kind: "any".to_string(),
                slug: slug.to_string(),
            }),
            [kind] => Ok(*kind),
            _ => Err(RoleError::AmbiguousRole(slug.to_string())),
        }
    }

    /// Infer a slug's kind from project-scope files only (promote flow).
    pub fn infer_project_kind(&self, slug: &str) -> Result<RoleKind, RoleError> {
        let matches: Vec<RoleKind> = RoleKind::ALL
            .into_iter()
            .filter(|&kind| self.exists_in_scope(Scope::Project, kind, slug))
            .collect();

        match matches.as_slice() {
            [] => Err(RoleError::RoleNotFound {
                kind: "project".to_string(),
                slug: slug.to_string(),
            }),
            [kind] => Ok(*kind),
            _ => Err(RoleError::AmbiguousRole(slug.to_string())),
        }
    }

    /// Resolve an ordered slug list into one top-level role plus its
    /// sub-roles. Sub-roles pull in their declared top-level dependency; all
    /// top-level contributions must agree on a single slug.
    pub fn resolve_chain(
        &self,
        slugs: &[String],
    ) -> Result<(RoleDocument, Vec<RoleDocument>), RoleError> {
        let mut top_role: Option<RoleDocument> = None;
        let mut sub_roles: Vec<RoleDocument> = Vec::new();
        let mut seen_subs: HashSet<String> = HashSet::new();

        for slug in slugs {
            let kind = self.infer_kind(slug)?;
            let role = self.resolve(kind, slug)?;

            match kind {
                RoleKind::TopLevel => {
                    Self::assign_top(&mut top_role, role)?;
                }
                RoleKind::SubRole => {
                    // The model invariant guarantees the dependency, but
                    // documents come from untrusted storage.
                    let dependency = role
                        .depends_on_top_level
                        .clone()
                        .ok_or_else(|| RoleError::MissingDependencyMetadata(role.slug.clone()))?;
                    let dependency_role = self.resolve(RoleKind::TopLevel, &dependency)?;
                    Self::assign_top(&mut top_role, dependency_role)?;

                    if seen_subs.insert(role.slug.clone()) {
                        sub_roles.push(role);
                    }
                }
            }
        }

        let top_role = top_role.ok_or(RoleError::NoTopLevelRole)?;
        Ok((top_role, sub_roles))
    }

    fn assign_top(
        current: &mut Option<RoleDocument>,
        candidate: RoleDocument,
    ) -> Result<(), RoleError> {
        match current {
            None => {
                *current = Some(candidate);
                Ok(())
            }
            Some(existing) if existing.slug == candidate.slug => Ok(()),
            Some(existing) => Err(RoleError::ConflictingTopLevel {
                first: existing.slug.clone(),
                second: candidate.slug,
            }),
        }
    }

    /// List roles across scopes with optional scope/kind filters. Order is
    /// builtin, user, project; files within a directory sort by name.
    pub fn list(
        &self,
        scope: Option<Scope>,
        kind: Option<RoleKind>,
    ) -> Result<Vec<RoleDocument>, RoleError> {
        let kinds: Vec<RoleKind> = RoleKind::ALL
            .into_iter()
            .filter(|&k| kind.is_none() || kind == Some(k))
            .collect();

        let mut roles = Vec::new();

        if scope.is_none() || scope == Some(Scope::Builtin) {
            for k in &kinds {
                let mut builtins: Vec<&BuiltinRole> =
                    BUILTIN_ROLES.iter().filter(|b| b.kind == *k).collect();
                builtins.sort_by_key(|b| b.slug);
                for entry in builtins {
                    roles.push(parse_role_str(
                        entry.raw,
                        Scope::Builtin,
                        &builtin_path(entry.kind, entry.slug),
                    )?);
                }
            }
        }

        let dir_scopes = [
            (Scope::User, self.user_root_dir()),
            (Scope::Project, self.project_root_dir()),
        ];
        for (dir_scope, root) in dir_scopes {
            if scope.is_some() && scope != Some(dir_scope) {
                continue;
            }
            for k in &kinds {
                let dir = root.join(k.dir_name());
                if !dir.is_dir() {
                    continue;
                }
                let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
                    .collect();
                files.sort();
                for file in files {
                    roles.push(parse_role_file(&file, dir_scope)?);
                }
            }
        }

        Ok(roles)
    }

    /// Load a role from project scope only, failing when absent.
    pub fn project_role(&self, kind: RoleKind, slug: &str) -> Result<RoleDocument, RoleError> {
        Self::load_from_dir(&self.project_root_dir(), Scope::Project, kind, slug)?.ok_or_else(
            || RoleError::RoleNotFound {
                kind: format!("project {kind}"),
                slug: slug.to_string(),
            },
        )
    }

    /// Load a role from user scope only, failing when absent.
    pub fn user_role(&self, kind: RoleKind, slug: &str) -> Result<RoleDocument, RoleError> {
        Self::load_from_dir(&self.user_root_dir(), Scope::User, kind, slug)?.ok_or_else(|| {
            RoleError::RoleNotFound {
                kind: format!("user {kind}"),
                slug: slug.to_string(),
            }
        })
    }

    /// Destination path for a user-scope role file (promote target).
    pub fn user_role_path(&self, kind: RoleKind, slug: &str) -> PathBuf {
        Self::role_path(&self.user_root_dir(), kind, slug)
    }
}
