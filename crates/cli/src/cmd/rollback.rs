//! Implementation of the `reposync rollback` command.
//!
//! Reads a rollback plan written by `apply` and executes it against the
//! remote with the usual delete, update, create ordering.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use reposync_lib::diff::ChangeSet;
use reposync_lib::item::{RequiredBuild, ReviewerGroup, Webhook};
use reposync_lib::plan::read_rollback_plan;
use reposync_lib::remote::FileRemote;
use reposync_lib::repository::count_items;
use reposync_lib::rollback::execute_rollback;
use reposync_lib::state::StateItem;

use super::diff::print_change_set;
use super::{Domain, ExecArgs};
use crate::output::{OutputFormat, print_error, print_info, print_json, print_stat, print_success, print_warning};

#[derive(Debug, Args)]
pub struct RollbackArgs {
  /// Rollback plan written by `apply`
  #[arg(long)]
  pub plan: PathBuf,

  /// Item domain the plan was built for
  #[arg(long, value_enum)]
  pub domain: Domain,

  /// State document serving as the remote system
  #[arg(long, env = "REPOSYNC_REMOTE")]
  pub remote: PathBuf,

  #[command(flatten)]
  pub exec: ExecArgs,
}

pub fn cmd_rollback(args: &RollbackArgs, format: OutputFormat) -> Result<()> {
  match args.domain {
    Domain::Webhooks => run::<Webhook>(args, format),
    Domain::RequiredBuilds => run::<RequiredBuild>(args, format),
    Domain::ReviewerGroups => run::<ReviewerGroup>(args, format),
  }
}

fn run<T: StateItem>(args: &RollbackArgs, format: OutputFormat) -> Result<()> {
  let plan = read_rollback_plan::<T>(&args.plan)
    .with_context(|| format!("Failed to read rollback plan: {}", args.plan.display()))?;

  if plan.is_empty() {
    if format.is_json() {
      print_json(&serde_json::json!({ "domain": args.domain.as_str(), "success": true, "total": 0 }))?;
    } else {
      print_info("Rollback plan is empty, nothing to do.");
    }
    return Ok(());
  }

  if !format.is_json() {
    print_change_set(&ChangeSet::from(plan.clone()));
    println!();
    if !plan.create.is_empty() {
      print_warning("Recreated items receive new ids from the remote");
    }
  }

  let remote = Arc::new(FileRemote::open(&args.remote).context("Failed to open remote")?);
  let config = args.exec.config();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let outcome = rt.block_on(execute_rollback(plan, remote.clone(), &config));
  rt.block_on(remote.persist()).context("Failed to save remote")?;

  if format.is_json() {
    print_json(&serde_json::json!({
      "domain": args.domain.as_str(),
      "success": outcome.is_success(),
      "total": outcome.total(),
      "failed_phase": outcome.failure.as_ref().map(|failure| failure.phase),
    }))?;
  } else {
    if outcome.is_success() {
      print_success("Rollback complete!");
    } else {
      print_error("Rollback stopped after a failed phase");
    }
    print_stat("Deleted", &count_items(&outcome.deleted).to_string());
    print_stat("Restored", &count_items(&outcome.updated).to_string());
    print_stat("Recreated", &count_items(&outcome.created).to_string());
  }

  match outcome.error() {
    Some(err) => Err(err).context("Rollback failed"),
    None => Ok(()),
  }
}
