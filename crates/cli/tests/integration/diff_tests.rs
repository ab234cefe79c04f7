//! Diff command integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, fixture_path};

#[test]
fn diff_lists_changes_in_phase_order() {
  let env = TestEnv::new();

  let output = env
    .cmd()
    .arg("diff")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("webhooks")
    .assert()
    .success()
    .stdout(predicate::str::contains("2 to create, 1 to update, 2 to delete"))
    .get_output()
    .stdout
    .clone();

  let stdout = String::from_utf8(output).unwrap();
  let delete = stdout.find("- PLAT/api webhook 'chat' (id 2)").unwrap();
  let update = stdout.find("~ PLAT/api webhook 'ci' (id 1)").unwrap();
  let create = stdout.find("+ PLAT/web webhook 'preview'").unwrap();
  assert!(delete < update && update < create);
}

#[test]
fn diff_of_identical_states_is_empty() {
  let env = TestEnv::from_fixtures("current.yaml", "current.yaml");

  env
    .cmd()
    .arg("diff")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("webhooks")
    .assert()
    .success()
    .stdout(predicate::str::contains("No changes"));
}

#[test]
fn json_and_yaml_states_are_interchangeable() {
  let env = TestEnv::from_fixtures("current.json", "current.yaml");

  env
    .cmd()
    .arg("diff")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("required-builds")
    .assert()
    .success()
    .stdout(predicate::str::contains("No changes"));
}

#[test]
fn diff_writes_plan_document() {
  let env = TestEnv::new();
  let plan = env.path("plan.yaml");

  env
    .cmd()
    .arg("diff")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("required-builds")
    .arg("--output")
    .arg(&plan)
    .assert()
    .success()
    .stdout(predicate::str::contains("Diff written to"));

  let content = std::fs::read_to_string(&plan).unwrap();
  assert!(content.starts_with("diff:\n"));
  assert!(content.contains("lint"));
}

#[test]
fn diff_output_is_stable_across_runs() {
  let env = TestEnv::new();

  for name in ["a.json", "b.json"] {
    env
      .cmd()
      .arg("diff")
      .arg("--current")
      .arg(&env.current)
      .arg("--desired")
      .arg(&env.desired)
      .arg("--domain")
      .arg("webhooks")
      .arg("--output")
      .arg(env.path(name))
      .assert()
      .success();
  }

  assert_eq!(
    std::fs::read(env.path("a.json")).unwrap(),
    std::fs::read(env.path("b.json")).unwrap()
  );
}

#[test]
fn force_update_resends_unchanged_items() {
  let env = TestEnv::from_fixtures("current.yaml", "current.yaml");

  env
    .cmd()
    .arg("diff")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("webhooks")
    .arg("--force-update")
    .assert()
    .success()
    .stdout(predicate::str::contains("0 to create, 3 to update, 0 to delete"));
}

#[test]
fn json_format_reports_counts() {
  let env = TestEnv::new();

  env
    .cmd()
    .arg("--format")
    .arg("json")
    .arg("diff")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("webhooks")
    .assert()
    .success()
    .stdout(predicate::str::contains("\"create\": 2"))
    .stdout(predicate::str::contains("\"domain\": \"webhooks\""));
}

#[test]
fn strict_ids_rejects_duplicates() {
  let env = TestEnv::from_fixtures("current.yaml", "duplicate_ids.yaml");

  env
    .cmd()
    .arg("diff")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("webhooks")
    .arg("--strict-ids")
    .assert()
    .failure()
    .stderr(predicate::str::contains("duplicate webhook ids"));
}

#[test]
fn duplicates_are_tolerated_without_strict_ids() {
  let env = TestEnv::from_fixtures("current.yaml", "duplicate_ids.yaml");

  env
    .cmd()
    .arg("diff")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("webhooks")
    .assert()
    .success()
    .stdout(predicate::str::contains("webhook 'second' (id 1)"))
    .stdout(predicate::str::contains("webhook 'first'").not());
}

#[test]
fn traversal_in_state_path_is_rejected() {
  let env = TestEnv::new();

  env
    .cmd()
    .arg("diff")
    .arg("--current")
    .arg("../current.yaml")
    .arg("--desired")
    .arg(fixture_path("desired.yaml"))
    .arg("--domain")
    .arg("webhooks")
    .assert()
    .failure()
    .stderr(predicate::str::contains("parent directory"));
}
