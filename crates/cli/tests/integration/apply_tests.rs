//! Apply command integration tests.

use predicates::prelude::*;
use reposync_lib::item::RequiredBuild;
use reposync_lib::state::StateDocument;

use super::common::{TestEnv, hook_names};

#[test]
fn apply_brings_remote_to_desired_state() {
  let env = TestEnv::new();

  env
    .apply_cmd("webhooks")
    .assert()
    .success()
    .stdout(predicate::str::contains("Apply complete"))
    .stdout(predicate::str::contains("Created: 2"));

  let remote = env.remote_webhooks();
  assert_eq!(
    hook_names(&remote),
    vec![
      ("PLAT/api".to_string(), vec!["ci".to_string(), "deploy".to_string()]),
      ("PLAT/web".to_string(), vec!["preview".to_string()]),
    ]
  );

  let ci = remote[0].items.iter().find(|hook| hook.name == "ci").unwrap();
  assert_eq!(ci.id, Some(1));
  assert!(!ci.active);

  // New ids continue after the highest existing webhook id.
  let mut new_ids: Vec<_> = remote
    .iter()
    .flat_map(|entry| &entry.items)
    .filter(|hook| hook.name != "ci")
    .filter_map(|hook| hook.id)
    .collect();
  new_ids.sort();
  assert_eq!(new_ids, vec![10, 11]);
}

#[test]
fn apply_only_touches_selected_domain() {
  let env = TestEnv::new();

  env.apply_cmd("required-builds").assert().success();

  let document = StateDocument::load(&env.remote).unwrap();
  let builds = document.declared::<RequiredBuild>();
  assert_eq!(builds[0].items[0].build_parent_keys, vec!["build", "lint"]);
  assert_eq!(
    hook_names(&env.remote_webhooks()),
    vec![
      ("PLAT/api".to_string(), vec!["chat".to_string(), "ci".to_string()]),
      ("PLAT/legacy".to_string(), vec!["audit".to_string()]),
    ]
  );
}

#[test]
fn apply_is_idempotent() {
  let env = TestEnv::new();

  env.apply_cmd("required-builds").assert().success();

  // The remote now matches desired; diffing it against desired finds nothing.
  env
    .cmd()
    .arg("apply")
    .arg("--current")
    .arg(&env.remote)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("required-builds")
    .arg("--remote")
    .arg(&env.remote)
    .assert()
    .success()
    .stdout(predicate::str::contains("No changes"));
}

#[test]
fn noop_apply_still_writes_usable_outputs() {
  let env = TestEnv::from_fixtures("current.yaml", "current.yaml");
  let rollback = env.path("rollback.yaml");
  let results = env.path("results.json");
  let remote = env.path("fresh-remote.yaml");

  env
    .cmd()
    .arg("apply")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("webhooks")
    .arg("--remote")
    .arg(&remote)
    .arg("--rollback-plan")
    .arg(&rollback)
    .arg("--results")
    .arg(&results)
    .assert()
    .success()
    .stdout(predicate::str::contains("No changes"));

  assert!(remote.exists());
  assert!(std::fs::read_to_string(&results).unwrap().contains("\"applied\""));
  assert!(std::fs::read_to_string(&rollback).unwrap().starts_with("rollback:"));

  env
    .cmd()
    .arg("rollback")
    .arg("--plan")
    .arg(&rollback)
    .arg("--domain")
    .arg("webhooks")
    .arg("--remote")
    .arg(&remote)
    .assert()
    .success()
    .stdout(predicate::str::contains("nothing to do"));
}

#[test]
fn apply_writes_rollback_plan_and_results() {
  let env = TestEnv::new();
  let rollback = env.path("rollback.yaml");
  let results = env.path("results.json");

  env
    .apply_cmd("webhooks")
    .arg("--rollback-plan")
    .arg(&rollback)
    .arg("--results")
    .arg(&results)
    .assert()
    .success()
    .stdout(predicate::str::contains("Rollback plan written to"));

  let plan = std::fs::read_to_string(&rollback).unwrap();
  assert!(plan.starts_with("rollback:\n"));
  assert!(plan.contains("name: chat"));
  assert!(plan.contains("name: audit"));

  let applied = std::fs::read_to_string(&results).unwrap();
  assert!(applied.contains("\"applied\""));
  assert!(applied.contains("\"preview\""));
}

#[test]
fn no_echo_rollback_suppresses_plan_output() {
  let env = TestEnv::new();

  env
    .apply_cmd("webhooks")
    .arg("--no-echo-rollback")
    .assert()
    .success()
    .stdout(predicate::str::contains("rollback:").not());
}

#[test]
fn failed_phase_exits_non_zero_and_keeps_partial_outputs() {
  let env = TestEnv::new();
  let rollback = env.path("rollback.yaml");

  // The remote no longer has the `legacy` repository, so deleting from it fails.
  let mut document = StateDocument::load(&env.remote).unwrap();
  document.repositories.retain(|config| config.slug != "legacy");
  document.save(&env.remote).unwrap();

  env
    .apply_cmd("webhooks")
    .arg("--rollback-plan")
    .arg(&rollback)
    .assert()
    .failure()
    .stderr(predicate::str::contains("delete phase failed"))
    .stderr(predicate::str::contains("PLAT/legacy"));

  // The delete in PLAT/api still happened; nothing was updated or created.
  assert_eq!(
    hook_names(&env.remote_webhooks()),
    vec![("PLAT/api".to_string(), vec!["ci".to_string()])]
  );
  let plan = std::fs::read_to_string(&rollback).unwrap();
  assert!(plan.contains("name: chat"));
  assert!(!plan.contains("name: audit"));
}

#[test]
fn remote_can_come_from_environment() {
  let env = TestEnv::new();

  env
    .cmd()
    .env("REPOSYNC_REMOTE", &env.remote)
    .env("REPOSYNC_PARALLELISM", "1")
    .arg("apply")
    .arg("--current")
    .arg(&env.current)
    .arg("--desired")
    .arg(&env.desired)
    .arg("--domain")
    .arg("webhooks")
    .assert()
    .success();

  assert_eq!(env.remote_webhooks().len(), 3);
}
