mod apply;
mod diff;
mod rollback;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::debug;

use reposync_lib::diff::{ChangeSet, compute_diff};
use reposync_lib::execute::ApplyConfig;
use reposync_lib::repository::DeclaredState;
use reposync_lib::state::{StateDocument, StateItem, check_unique_ids};

pub use apply::{ApplyArgs, cmd_apply};
pub use diff::cmd_diff;
pub use rollback::{RollbackArgs, cmd_rollback};

/// Item domain to reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Domain {
  Webhooks,
  RequiredBuilds,
  ReviewerGroups,
}

impl Domain {
  pub fn as_str(self) -> &'static str {
    match self {
      Domain::Webhooks => "webhooks",
      Domain::RequiredBuilds => "required-builds",
      Domain::ReviewerGroups => "reviewer-groups",
    }
  }
}

/// Inputs shared by `diff` and `apply`.
#[derive(Debug, Args)]
pub struct DiffArgs {
  /// State document describing what the remote holds now
  #[arg(long)]
  pub current: PathBuf,

  /// State document describing what the remote should hold
  #[arg(long)]
  pub desired: PathBuf,

  /// Item domain to reconcile
  #[arg(long, value_enum)]
  pub domain: Domain,

  /// Re-send every item the current state knows, even if unchanged
  #[arg(long)]
  pub force_update: bool,

  /// Fail if either state declares the same id twice in one repository
  #[arg(long)]
  pub strict_ids: bool,
}

/// Execution settings shared by `apply` and `rollback`.
#[derive(Debug, Args)]
pub struct ExecArgs {
  /// Maximum number of concurrent remote calls (default: available CPUs)
  #[arg(long, env = "REPOSYNC_PARALLELISM")]
  pub parallelism: Option<usize>,

  /// Give up on a single remote call after this many seconds
  #[arg(long)]
  pub timeout_secs: Option<u64>,
}

impl ExecArgs {
  pub fn config(&self) -> ApplyConfig {
    let mut config = ApplyConfig::default();
    if let Some(parallelism) = self.parallelism {
      config.parallelism = parallelism.max(1);
    }
    config.call_timeout = self.timeout_secs.map(Duration::from_secs);
    config
  }
}

/// Load one domain of a state document.
fn load_state<T: StateItem>(path: &Path, strict_ids: bool) -> Result<DeclaredState<T>> {
  let document = StateDocument::load(path).with_context(|| format!("Failed to load state: {}", path.display()))?;
  let state = document.declared::<T>();

  if strict_ids {
    check_unique_ids(&state).with_context(|| format!("Invalid state: {}", path.display()))?;
  }

  Ok(state)
}

/// Load both states and compute their change set.
fn plan_change_set<T: StateItem>(args: &DiffArgs) -> Result<(DeclaredState<T>, ChangeSet<T>)> {
  let current = load_state::<T>(&args.current, args.strict_ids)?;
  let desired = load_state::<T>(&args.desired, args.strict_ids)?;

  let mut change_set = compute_diff(&current, &desired);
  if args.force_update {
    debug!("forcing updates for every known item");
    change_set = change_set.with_forced_updates(&current, &desired);
  }

  Ok((current, change_set))
}
