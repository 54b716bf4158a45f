use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::SetupAgent;
use crate::domain::errors::RoleError;

pub const CONFIG_FILE_NAME: &str = "rolekit.toml";
pub const DEFAULT_PROJECT_ROLES_DIR: &str = ".rolekit/roles";
pub const DEFAULT_OUTPUT_DIR: &str = ".rolekit/generated";

pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE_NAME)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub setup: SetupConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_roles: Vec<UserRoleConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            paths: PathsConfig::default(),
            setup: SetupConfig::default(),
            user_roles: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_project_roles_dir")]
    pub project_roles_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_roles_dir: default_project_roles_dir(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default)]
    pub agent: SetupAgent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codex_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_dir: Option<String>,
}

/// One named user role assembly preset. New-style entries carry an ordered
/// `roles` list; legacy entries carry a top-level slug plus sub-role slugs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRoleConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_level_role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
}

impl UserRoleConfig {
    /// Normalize both config shapes to one ordered slug list, preferring
    /// the new-style `roles` field.
    pub fn resolved_roles(&self) -> Vec<String> {
        if !self.roles.is_empty() {
            return self.roles.clone();
        }

        let mut legacy = Vec::new();
        if let Some(top) = &self.top_level_role {
            legacy.push(top.clone());
        }
        legacy.extend(self.sub_roles.iter().cloned());
        legacy
    }

    pub fn uses_legacy_shape(&self) -> bool {
        self.roles.is_empty() && self.top_level_role.is_some()
    }
}

fn default_version() -> u32 {
    1
}

fn default_project_roles_dir() -> String {
    DEFAULT_PROJECT_ROLES_DIR.to_string()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

/// Load and validate a config file, failing when it does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig, RoleError> {
    if !path.exists() {
        return Err(RoleError::Config(format!(
            "config not found: {}",
            path.display()
        )));
    }

    let raw = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&raw)
        .map_err(|error| RoleError::Config(format!("{}: {}", path.display(), error.message())))?;

    for entry in &config.user_roles {
        if entry.name.trim().is_empty() {
            return Err(RoleError::Config(
                "each 'user_roles' entry must have a non-empty name".to_string(),
            ));
        }
        if entry.roles.is_empty() && entry.top_level_role.is_none() {
            return Err(RoleError::Config(format!(
                "user role '{}' must define either 'roles' or 'top_level_role'",
                entry.name
            )));
        }
    }

    Ok(config)
}

/// Write the config back with deterministic field ordering.
pub fn write_config(path: &Path, config: &AppConfig) -> Result<(), RoleError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|error| RoleError::Config(format!("cannot serialize config: {error}")))?;
    std::fs::write(path, rendered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_config(raw: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, raw).expect("write config");
        (dir, path)
    }

    #[test]
    fn loads_config_with_defaults() {
        let (_dir, path) = write_temp_config("version = 1\n");
        let config = load_config(&path).expect("load config");
        assert_eq!(config.version, 1);
        assert_eq!(config.paths.project_roles_dir, DEFAULT_PROJECT_ROLES_DIR);
        assert_eq!(config.paths.output_dir, DEFAULT_OUTPUT_DIR);
        assert!(config.user_roles.is_empty());
    }

    #[test]
    fn legacy_user_role_shape_normalizes_to_ordered_slugs() {
        let (_dir, path) = write_temp_config(
            r#"version = 1

[[user_roles]]
name = "legacy"
top_level_role = "reviewer"
sub_roles = ["code-review", "project-audit"]
"#,
        );
        let config = load_config(&path).expect("load config");
        let entry = &config.user_roles[0];
        assert!(entry.uses_legacy_shape());
        assert_eq!(
            entry.resolved_roles(),
            ["reviewer", "code-review", "project-audit"]
        );
    }

    #[test]
    fn roles_list_takes_precedence_over_legacy_fields() {
        let (_dir, path) = write_temp_config(
            r#"version = 1

[[user_roles]]
name = "mixed"
roles = ["code-review"]
top_level_role = "reviewer"
"#,
        );
        let config = load_config(&path).expect("load config");
        let entry = &config.user_roles[0];
        assert!(!entry.uses_legacy_shape());
        assert_eq!(entry.resolved_roles(), ["code-review"]);
    }

    #[test]
    fn rejects_user_role_without_roles_or_top_level() {
        let (_dir, path) = write_temp_config(
            "version = 1\n\n[[user_roles]]\nname = \"broken\"\n",
        );
        let error = load_config(&path).unwrap_err();
        assert!(matches!(error, RoleError::Config(_)));
    }

    #[test]
    fn missing_config_is_a_config_failure() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(error, RoleError::Config(_)));
    }

    #[test]
    fn config_round_trips_through_write_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = AppConfig {
            user_roles: vec![UserRoleConfig {
                name: "default".to_string(),
                roles: vec!["code-review".to_string()],
                top_level_role: None,
                sub_roles: Vec::new(),
                output_filename: Some("review.md".to_string()),
            }],
            ..AppConfig::default()
        };

        write_config(&path, &config).expect("write config");
        let loaded = load_config(&path).expect("load config");
        assert_eq!(loaded.user_roles[0].name, "default");
        assert_eq!(loaded.user_roles[0].resolved_roles(), ["code-review"]);
        assert_eq!(
            loaded.user_roles[0].output_filename.as_deref(),
            Some("review.md")
        );
    }
}
