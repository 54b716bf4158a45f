use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

mod common;
use common::TestEnv;

fn load_schema(name: &str) -> Value {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let raw = fs::read_to_string(root.join("docs/contracts").join(name)).expect("read schema");
    serde_json::from_str(&raw).expect("parse schema")
}

fn validate(schema_name: &str, data: &Value) {
    let schema = load_schema(schema_name);
    let validator = JSONSchema::compile(&schema).expect("compile schema");
    let messages: Vec<String> = match validator.validate(data) {
        Ok(()) => return,
        Err(errors) => errors.map(|e| e.to_string()).collect(),
    };
    panic!("schema validation failed: {}", messages.join(" | "));
}

#[test]
fn contracts_check() {
    let env = TestEnv::new();
    env.write_project_role("sub-role", "code-review", "## Evaluation Areas\n- existing item");

    let list = env.run_json(&["list"]);
    assert_eq!(list["ok"], true);
    validate("roles-list.schema.json", &list["data"]);

    let assemble = env.run_json(&["assemble", "--role", "code-review"]);
    assert_eq!(assemble["ok"], true);
    validate("assemble.schema.json", &assemble["data"]);

    let review = env.run_json(&[
        "review",
        "--target-sub-role",
        "code-review",
        "--use-stub",
        "--yes",
    ]);
    assert_eq!(review["ok"], true);
    validate("review-summary.schema.json", &review["data"]);
}
