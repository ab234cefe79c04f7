//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use reposync_lib::item::Webhook;
use reposync_lib::repository::DeclaredState;
use reposync_lib::state::StateDocument;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the current and
/// desired states, plus a remote document that starts as a copy of the
/// current state.
pub struct TestEnv {
  pub temp: TempDir,
  pub current: PathBuf,
  pub desired: PathBuf,
  pub remote: PathBuf,
}

impl TestEnv {
  /// Create from the `current.yaml` / `desired.yaml` fixtures.
  pub fn new() -> Self {
    Self::from_fixtures("current.yaml", "desired.yaml")
  }

  pub fn from_fixtures(current: &str, desired: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let current_path = temp.path().join(current);
    let desired_path = temp.path().join(format!("desired-{}", desired));
    let remote = temp.path().join("remote.yaml");

    std::fs::write(&current_path, fixture_content(current)).unwrap();
    std::fs::write(&desired_path, fixture_content(desired)).unwrap();
    std::fs::write(&remote, fixture_content(current)).unwrap();

    Self {
      temp,
      current: current_path,
      desired: desired_path,
      remote,
    }
  }

  /// Path inside the temp directory.
  pub fn path(&self, name: &str) -> PathBuf {
    self.temp.path().join(name)
  }

  /// Get a Command for the reposync binary with a clean environment.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("reposync");
    cmd.env_remove("REPOSYNC_REMOTE");
    cmd.env_remove("REPOSYNC_PARALLELISM");
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(self.temp.path());
    cmd
  }

  /// `apply` with the current, desired and remote paths filled in.
  pub fn apply_cmd(&self, domain: &str) -> Command {
    let mut cmd = self.cmd();
    cmd
      .arg("apply")
      .arg("--current")
      .arg(&self.current)
      .arg("--desired")
      .arg(&self.desired)
      .arg("--domain")
      .arg(domain)
      .arg("--remote")
      .arg(&self.remote);
    cmd
  }

  /// Webhooks the remote currently holds.
  pub fn remote_webhooks(&self) -> DeclaredState<Webhook> {
    StateDocument::load(&self.remote).unwrap().declared()
  }
}

/// `(repository, sorted hook names)` for every non-empty repository, ignoring ids.
pub fn hook_names(state: &DeclaredState<Webhook>) -> Vec<(String, Vec<String>)> {
  let mut names: Vec<_> = state
    .iter()
    .filter(|entry| !entry.items.is_empty())
    .map(|entry| {
      let mut hooks: Vec<_> = entry.items.iter().map(|hook| hook.name.clone()).collect();
      hooks.sort();
      (entry.repository.to_string(), hooks)
    })
    .collect();
  names.sort();
  names
}
