//! Implementation of the `reposync diff` command.
//!
//! Compares two state documents for one domain, prints the change set and
//! optionally writes it as a diff document.

use std::path::PathBuf;

use anyhow::{Context, Result};

use reposync_lib::diff::ChangeSet;
use reposync_lib::item::{RequiredBuild, ReviewerGroup, Webhook};
use reposync_lib::plan::write_diff;
use reposync_lib::state::StateItem;

use super::{DiffArgs, Domain, plan_change_set};
use crate::output::{OutputFormat, print_bucket, print_info, print_json, print_success, symbols};

pub fn cmd_diff(args: &DiffArgs, output: Option<PathBuf>, format: OutputFormat) -> Result<()> {
  match args.domain {
    Domain::Webhooks => run::<Webhook>(args, output, format),
    Domain::RequiredBuilds => run::<RequiredBuild>(args, output, format),
    Domain::ReviewerGroups => run::<ReviewerGroup>(args, output, format),
  }
}

fn run<T: StateItem>(args: &DiffArgs, output: Option<PathBuf>, format: OutputFormat) -> Result<()> {
  let (_, mut change_set) = plan_change_set::<T>(args)?;
  change_set.normalize();

  if let Some(path) = &output {
    write_diff(path, &change_set, None).with_context(|| format!("Failed to write diff: {}", path.display()))?;
  }

  if format.is_json() {
    let (create, update, delete) = change_set.counts();
    print_json(&serde_json::json!({
      "domain": args.domain.as_str(),
      "create": create,
      "update": update,
      "delete": delete,
      "diff": change_set,
    }))?;
    return Ok(());
  }

  print_change_set(&change_set);
  if let Some(path) = &output {
    print_success(&format!("Diff written to {}", path.display()));
  }

  Ok(())
}

/// Listing in phase order, followed by the counts.
pub(super) fn print_change_set<T: StateItem>(change_set: &ChangeSet<T>) {
  if change_set.is_empty() {
    print_info("No changes.");
    return;
  }

  print_bucket(symbols::REMOVE, &change_set.delete);
  print_bucket(symbols::MODIFY, &change_set.update);
  print_bucket(symbols::ADD, &change_set.create);

  let (create, update, delete) = change_set.counts();
  println!();
  println!("{} to create, {} to update, {} to delete", create, update, delete);
}
