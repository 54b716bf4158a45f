use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub project: PathBuf,
    pub home: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let project = tmp.path().join("project");
        let home = tmp.path().join("home");
        fs::create_dir_all(&project).expect("create project dir");
        fs::create_dir_all(&home).expect("create isolated home");

        Self {
            _tmp: tmp,
            project,
            home,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("rolekit");
        cmd.arg("--project-root")
            .arg(&self.project)
            .arg("--user-home")
            .arg(&self.home);
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn run_json_failure(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("error json output")
    }

    pub fn write_project_role(&self, kind: &str, slug: &str, body: &str) -> PathBuf {
        write_role_file(&self.project.join(".rolekit/roles"), kind, slug, "", body)
    }

    pub fn write_project_role_with(
        &self,
        kind: &str,
        slug: &str,
        front_matter_extra: &str,
        body: &str,
    ) -> PathBuf {
        write_role_file(
            &self.project.join(".rolekit/roles"),
            kind,
            slug,
            front_matter_extra,
            body,
        )
    }

    pub fn write_user_role(&self, kind: &str, slug: &str, body: &str) -> PathBuf {
        write_role_file(&self.home.join("roles"), kind, slug, "", body)
    }

    pub fn write_config(&self, raw: &str) {
        fs::write(self.project.join("rolekit.toml"), raw).expect("write config");
    }

    pub fn write_changes_file(&self, raw: &str) -> PathBuf {
        let path = self.project.join("changes.toml");
        fs::write(&path, raw).expect("write changes file");
        path
    }
}

fn kind_dir(kind: &str) -> &'static str {
    match kind {
        "top-level" => "top_level",
        "sub-role" => "sub_roles",
        other => panic!("unknown role kind: {other}"),
    }
}

pub fn write_role_file(
    root: &std::path::Path,
    kind: &str,
    slug: &str,
    front_matter_extra: &str,
    body: &str,
) -> PathBuf {
    let dependency_line = if kind == "sub-role" {
        "depends_on_top_level = \"reviewer\"\n"
    } else {
        ""
    };
    let path = root.join(kind_dir(kind)).join(format!("{slug}.md"));
    fs::create_dir_all(path.parent().expect("role dir")).expect("create role dir");
    fs::write(
        &path,
        format!(
            "+++\nkind = \"{kind}\"\nname = \"{slug}\"\nslug = \"{slug}\"\nversion = \"1.0.0\"\n{dependency_line}{front_matter_extra}+++\n\n{body}\n"
        ),
    )
    .expect("write role file");
    path
}
