//! Implementation of the `reposync apply` command.
//!
//! Diffs the current and desired states, applies the change set to the
//! remote, and records how to undo it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use reposync_lib::execute::{ApplyOutcome, apply_change_set};
use reposync_lib::item::{RequiredBuild, ReviewerGroup, Webhook};
use reposync_lib::plan::{DocumentFormat, render_rollback_plan, write_applied, write_rollback_plan};
use reposync_lib::remote::FileRemote;
use reposync_lib::repository::count_items;
use reposync_lib::rollback::{RollbackPlan, build_rollback_plan};
use reposync_lib::state::StateItem;

use super::diff::print_change_set;
use super::{DiffArgs, Domain, ExecArgs, plan_change_set};
use crate::output::{OutputFormat, format_duration, print_error, print_info, print_json, print_stat, print_success};

#[derive(Debug, Args)]
pub struct ApplyArgs {
  #[command(flatten)]
  pub diff: DiffArgs,

  /// State document serving as the remote system
  #[arg(long, env = "REPOSYNC_REMOTE")]
  pub remote: PathBuf,

  #[command(flatten)]
  pub exec: ExecArgs,

  /// Write the rollback plan to this file
  #[arg(long)]
  pub rollback_plan: Option<PathBuf>,

  /// Write the created and updated items to this file
  #[arg(long)]
  pub results: Option<PathBuf>,

  /// Do not print the rollback plan
  #[arg(long)]
  pub no_echo_rollback: bool,
}

/// Execute the apply command.
///
/// Outputs (remote document, rollback plan, results) are written even when a
/// phase fails, so that the partial apply can be rolled back, and when there
/// is nothing to apply, so that the rollback plan is always usable. A failed
/// phase still makes the command exit with an error.
pub fn cmd_apply(args: &ApplyArgs, format: OutputFormat) -> Result<()> {
  match args.diff.domain {
    Domain::Webhooks => run::<Webhook>(args, format),
    Domain::RequiredBuilds => run::<RequiredBuild>(args, format),
    Domain::ReviewerGroups => run::<ReviewerGroup>(args, format),
  }
}

fn run<T: StateItem>(args: &ApplyArgs, format: OutputFormat) -> Result<()> {
  let (current, change_set) = plan_change_set::<T>(&args.diff)?;
  let config = args.exec.config();
  let remote = Arc::new(FileRemote::open(&args.remote).context("Failed to open remote")?);

  if !format.is_json() {
    print_change_set(&change_set);
    if !change_set.is_empty() {
      println!();
    }
  }

  info!(domain = args.diff.domain.as_str(), remote = %args.remote.display(), "applying change set");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();
  let outcome = rt.block_on(apply_change_set(&change_set, remote.clone(), &config));
  let elapsed = started.elapsed();
  rt.block_on(remote.persist()).context("Failed to save remote")?;

  let rollback = build_rollback_plan(&current, &change_set, &outcome);

  if let Some(path) = &args.rollback_plan {
    write_rollback_plan(path, &rollback, None)
      .with_context(|| format!("Failed to write rollback plan: {}", path.display()))?;
  }
  if let Some(path) = &args.results {
    write_applied(path, &outcome.applied(), None)
      .with_context(|| format!("Failed to write results: {}", path.display()))?;
  }

  if format.is_json() {
    print_json(&serde_json::json!({
      "domain": args.diff.domain.as_str(),
      "success": outcome.is_success(),
      "deleted": outcome.deleted,
      "updated": outcome.updated,
      "created": outcome.created,
      "failed_phase": outcome.failure.as_ref().map(|failure| failure.phase),
      "errors": outcome
        .failure
        .as_ref()
        .map(|failure| failure.failures.iter().map(ToString::to_string).collect::<Vec<_>>())
        .unwrap_or_default(),
      "rollback": rollback,
    }))?;
  } else if !change_set.is_empty() {
    print_summary(&outcome, args, elapsed);
    if !args.no_echo_rollback {
      echo_rollback(&rollback, args.rollback_plan.as_deref())?;
    }
  }

  match outcome.error() {
    Some(err) => Err(err).context("Apply failed"),
    None => Ok(()),
  }
}

fn print_summary<T: StateItem>(outcome: &ApplyOutcome<T>, args: &ApplyArgs, elapsed: Duration) {
  if outcome.is_success() {
    print_success("Apply complete!");
  } else {
    print_error("Apply stopped after a failed phase");
  }
  print_stat("Deleted", &count_items(&outcome.deleted).to_string());
  print_stat("Updated", &count_items(&outcome.updated).to_string());
  print_stat("Created", &count_items(&outcome.created).to_string());
  print_stat("Duration", &format_duration(elapsed));

  if let Some(failure) = &outcome.failure {
    for item in &failure.failures {
      print_error(&format!("{}: {}", failure.phase, item));
    }
  }

  if let Some(path) = &args.results {
    print_stat("Results", &path.display().to_string());
  }
}

fn echo_rollback<T: StateItem>(rollback: &RollbackPlan<T>, written_to: Option<&Path>) -> Result<()> {
  if rollback.is_empty() {
    return Ok(());
  }

  println!();
  match written_to {
    Some(path) => print_info(&format!("Rollback plan written to {}:", path.display())),
    None => print_info("Rollback plan:"),
  }
  print!("{}", render_rollback_plan(rollback, DocumentFormat::Yaml)?);
  Ok(())
}
