use predicates::str::contains;
use serde_json::Value;
use std::fs;

mod common;
use common::TestEnv;

#[test]
fn list_includes_builtin_roles_by_default() {
    let env = TestEnv::new();

    let list = env.run_json(&["list"]);
    assert_eq!(list["ok"], true);
    let items = list["data"].as_array().expect("roles array");
    assert!(items
        .iter()
        .any(|item| item["scope"] == "builtin" && item["slug"] == "reviewer"));
    assert!(items
        .iter()
        .any(|item| item["scope"] == "builtin" && item["slug"] == "code-review"));
}

#[test]
fn list_honors_scope_and_kind_filters() {
    let env = TestEnv::new();
    env.write_project_role("sub-role", "project-only", "project body");

    let list = env.run_json(&["list", "--scope", "project", "--kind", "sub-role"]);
    let items = list["data"].as_array().expect("roles array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["slug"], "project-only");
    assert_eq!(items[0]["kind"], "sub-role");
}

#[test]
fn resolution_precedence_prefers_project_scope() {
    let env = TestEnv::new();
    env.write_user_role("top-level", "reviewer", "user body");
    env.write_project_role("top-level", "reviewer", "project body");

    let report = env.run_json(&["assemble", "--role", "reviewer"]);
    assert_eq!(report["ok"], true);
    assert_eq!(report["data"]["top_level"], "reviewer");
    assert_eq!(report["data"]["top_level_scope"], "project");

    let output = report["data"]["output"].as_str().expect("output path");
    let content = fs::read_to_string(output).expect("assembled artifact");
    assert!(content.contains("project body"));
    assert!(!content.contains("user body"));
}

#[test]
fn assemble_merges_sections_from_builtin_top_level() {
    let env = TestEnv::new();
    env.write_project_role_with(
        "sub-role",
        "code-review",
        "[output]\n\n[[output.sections]]\nkey = \"issues\"\ntype = \"list\"\nguidance = [\"g2\"]\nfields = [\"evidence\"]\nitem_contributions = [\"c1\"]\n",
        "Sub body",
    );

    let report = env.run_json(&["assemble", "--role", "code-review"]);
    assert_eq!(report["data"]["top_level"], "reviewer");
    assert_eq!(report["data"]["top_level_scope"], "builtin");
    assert_eq!(report["data"]["sub_roles"][0], "code-review");

    let output = report["data"]["output"].as_str().expect("output path");
    let filename = std::path::Path::new(output)
        .file_name()
        .expect("file name")
        .to_string_lossy()
        .into_owned();
    assert!(filename.starts_with("review_code-review_"));
    assert!(filename.ends_with(".md"));

    let content = fs::read_to_string(output).expect("assembled artifact");
    assert!(content.contains("### Issues (list)"));
    assert!(content.contains("  - severity"));
    assert!(content.contains("  - evidence"));
    assert!(content.contains("  - c1"));
    assert!(content.contains("### Sub-Role: code-review"));
}

#[test]
fn assemble_uses_configured_user_role_and_output_filename() {
    let env = TestEnv::new();
    env.write_config(
        "version = 1\n\n[[user_roles]]\nname = \"daily\"\nroles = [\"code-review\"]\noutput_filename = \"daily.md\"\n",
    );

    let report = env.run_json(&["assemble"]);
    let output = report["data"]["output"].as_str().expect("output path");
    assert!(output.ends_with("daily.md"));
    assert!(output.contains(".rolekit"));
    assert!(std::path::Path::new(output).exists());
}

#[test]
fn assemble_legacy_config_shape_warns_and_still_assembles() {
    let env = TestEnv::new();
    env.write_config(
        "version = 1\n\n[[user_roles]]\nname = \"legacy\"\ntop_level_role = \"reviewer\"\nsub_roles = [\"code-review\"]\n",
    );

    env.cmd()
        .args(["--json", "assemble"])
        .assert()
        .success()
        .stderr(contains("legacy"));
}

#[test]
fn assemble_unknown_role_reports_not_found_code() {
    let env = TestEnv::new();
    let err = env.run_json_failure(&["assemble", "--role", "missing"]);
    assert_eq!(err["ok"], false);
    assert_eq!(err["error"]["code"], "ROLE_NOT_FOUND");
}

#[test]
fn ambiguous_slug_reports_ambiguity_code() {
    let env = TestEnv::new();
    env.write_project_role("top-level", "shared", "top body");
    env.write_project_role("sub-role", "shared", "sub body");

    let err = env.run_json_failure(&["assemble", "--role", "shared"]);
    assert_eq!(err["error"]["code"], "AMBIGUOUS_ROLE");
}

#[test]
fn conflicting_top_level_roles_report_conflict_code() {
    let env = TestEnv::new();
    env.write_project_role("top-level", "editor", "editor body");

    let err = env.run_json_failure(&["assemble", "--role", "editor", "--role", "code-review"]);
    assert_eq!(err["error"]["code"], "CONFLICTING_TOP_LEVEL");
}

#[test]
fn review_applies_changes_then_reports_noop_on_rerun() {
    let env = TestEnv::new();
    let role_path = env.write_project_role(
        "sub-role",
        "code-review",
        "# Code Review\n\n## Evaluation Areas\n- existing item",
    );
    let changes = env.write_changes_file(
        "[[changes]]\ntarget_kind = \"sub-role\"\ntarget_slug = \"code-review\"\nop = \"add\"\nanchor = \"## Evaluation Areas\"\ntext = \"- extra check\"\n",
    );
    let changes_arg = changes.to_string_lossy().into_owned();

    let first = env.run_json(&[
        "review",
        "--target-sub-role",
        "code-review",
        "--changes-file",
        &changes_arg,
        "--yes",
    ]);
    assert_eq!(first["data"]["accepted_applied"], 1);
    assert_eq!(first["data"]["files_written"], 1);

    let content = fs::read_to_string(&role_path).expect("updated role file");
    assert!(content.contains("## Evaluation Areas\n- extra check\n- existing item"));

    let second = env.run_json(&[
        "review",
        "--target-sub-role",
        "code-review",
        "--changes-file",
        &changes_arg,
        "--yes",
    ]);
    assert_eq!(second["data"]["accepted_applied"], 0);
    assert_eq!(second["data"]["accepted_noop"], 1);
    assert_eq!(second["data"]["files_written"], 0);
    assert_eq!(
        fs::read_to_string(&role_path).expect("unchanged role file"),
        content
    );
}

#[test]
fn review_quit_skips_remaining_changes_and_writes_nothing() {
    let env = TestEnv::new();
    let first_path = env.write_project_role(
        "sub-role",
        "code-review",
        "## Evaluation Areas\n- existing item",
    );
    env.write_project_role(
        "sub-role",
        "project-audit",
        "## Evaluation Areas\n- existing item",
    );
    let before = fs::read_to_string(&first_path).expect("role file");

    env.cmd()
        .args([
            "review",
            "--target-sub-role",
            "code-review",
            "--target-sub-role",
            "project-audit",
            "--use-stub",
        ])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(contains("skipped: 2"))
        .stdout(contains("files written: 0"));

    assert_eq!(
        fs::read_to_string(&first_path).expect("role file"),
        before
    );
}

#[test]
fn review_contains_forbidden_target_without_losing_applied_changes() {
    let env = TestEnv::new();
    let role_path = env.write_project_role(
        "sub-role",
        "code-review",
        "## Evaluation Areas\n- existing item",
    );
    let changes = env.write_changes_file(
        "[[changes]]\ntarget_kind = \"sub-role\"\ntarget_slug = \"code-review\"\nop = \"add\"\nanchor = \"## Evaluation Areas\"\ntext = \"- extra check\"\n\n[[changes]]\ntarget_kind = \"top-level\"\ntarget_slug = \"reviewer\"\nop = \"add\"\ntext = \"- forbidden\"\n",
    );
    let changes_arg = changes.to_string_lossy().into_owned();

    let report = env.run_json(&[
        "review",
        "--target-sub-role",
        "code-review",
        "--changes-file",
        &changes_arg,
        "--yes",
    ]);
    assert_eq!(report["data"]["accepted_applied"], 1);
    assert_eq!(report["data"]["failed"], 1);
    assert_eq!(report["data"]["files_written"], 1);

    let content = fs::read_to_string(&role_path).expect("role file");
    assert!(content.contains("- extra check"));
    assert!(!content.contains("- forbidden"));
}

#[test]
fn review_requires_target_sub_role_flag() {
    let env = TestEnv::new();
    let err = env.run_json_failure(&["review", "--use-stub"]);
    assert_eq!(err["error"]["code"], "CONFIG");
}

#[test]
fn promote_then_diff_round_trips() {
    let env = TestEnv::new();
    env.write_project_role("sub-role", "code-review", "shared body");

    let promote = env.run_json(&["promote", "--role", "code-review", "--yes"]);
    assert_eq!(promote["data"]["slug"], "code-review");
    let destination = promote["data"]["destination"].as_str().expect("destination");
    assert!(std::path::Path::new(destination).exists());

    let clean_diff = env.run_json(&["diff", "--role", "code-review"]);
    assert_eq!(clean_diff["data"].as_array().expect("diff lines").len(), 0);

    env.write_project_role("sub-role", "code-review", "changed body");
    let diff = env.run_json(&["diff", "--role", "code-review"]);
    let lines: Vec<String> = diff["data"]
        .as_array()
        .expect("diff lines")
        .iter()
        .map(|line| line.as_str().unwrap_or_default().to_string())
        .collect();
    assert!(lines.iter().any(|line| line == "+changed body"));
    assert!(lines.iter().any(|line| line == "-shared body"));
}

#[test]
fn promote_without_confirmation_is_cancelled() {
    let env = TestEnv::new();
    env.write_project_role("sub-role", "code-review", "body");

    let report: Value = {
        let mut cmd = env.cmd();
        let out = cmd
            .args(["--json", "promote", "--role", "code-review"])
            .write_stdin("n\n")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    };
    assert_eq!(report["data"], "cancelled");
    assert!(!env.home.join("roles/sub_roles/code-review.md").exists());
}

#[test]
fn diff_requires_user_scope_copy() {
    let env = TestEnv::new();
    env.write_project_role("sub-role", "code-review", "body");

    let err = env.run_json_failure(&["diff", "--role", "code-review"]);
    assert_eq!(err["error"]["code"], "ROLE_NOT_FOUND");
}

#[test]
fn setup_installs_portable_prompt_and_persists_defaults() {
    let env = TestEnv::new();

    let first = env.run_json(&["setup", "--agent", "none", "--yes"]);
    assert_eq!(first["data"]["agent"], "none");
    assert_eq!(first["data"]["status"], "installed");
    let destination = first["data"]["destination"].as_str().expect("destination");
    assert!(std::path::Path::new(destination).exists());
    assert!(env.project.join("rolekit.toml").exists());

    let second = env.run_json(&["setup", "--agent", "none", "--yes"]);
    assert_eq!(second["data"]["status"], "up-to-date");
}
