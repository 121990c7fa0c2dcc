use jsonschema::validator_for;

use crate::mock;

fn read_schema(name: &str) -> serde_json::Value {
  let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
  let path = manifest_dir.join("tests").join("schemas").join(name);
  let data = std::fs::read(&path).expect("schema file");
  serde_json::from_slice(&data).expect("valid schema JSON")
}

fn compile_schema(name: &str) -> jsonschema::Validator {
  let schema = read_schema(name);
  validator_for(&schema).expect("compile schema")
}

#[test]
fn deployments_json_conforms_to_schema() {
  let tracker = mock::tracker();
  let v = mock::stdout_json(&mut mock::report_cmd(
    &tracker,
    &["--view", "deployments", "--project", "AT", "--discover-link-types"],
  ));

  let compiled = compile_schema("deployments.schema.json");
  compiled.validate(&v).expect("schema validation failed for deployments JSON");
}

#[test]
fn empty_deployments_conform_to_schema() {
  let tracker = mock::failing_tracker(404);
  let out = mock::report_cmd(&tracker, &["--view", "deployments"]).output().unwrap();
  // a missing search endpoint is a hard failure, not an empty report
  assert!(!out.status.success());

  let empty = test_support::MockTracker::start(|_| (200, "[]".to_string()));
  let v = mock::stdout_json(&mut mock::report_cmd(&empty, &["--view", "deployments"]));
  assert_eq!(v["project"], "APLUS");
  compile_schema("deployments.schema.json")
    .validate(&v)
    .expect("schema validation failed for empty deployments JSON");
}
