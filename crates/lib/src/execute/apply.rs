//! Apply orchestration.
//!
//! `apply_change_set` runs the three phases of a change set in order:
//!
//! 1. Delete items that are no longer declared
//! 2. Update items whose configuration changed
//! 3. Create new items
//!
//! Each phase is a barrier: every worker of a phase finishes before the next
//! phase is enqueued. A phase with failures still drains, but no later phase
//! starts. Nothing is undone automatically; build a rollback plan from the
//! outcome instead.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::diff::ChangeSet;
use crate::item::Item;
use crate::repository::count_items;

use super::client::ItemClient;
use super::types::{ApplyConfig, ApplyOutcome, Phase, PhaseFailure};
use super::run_phase;

/// Apply `change_set` through `client`.
///
/// # Returns
///
/// An [`ApplyOutcome`] with the per-phase results. A failed phase is
/// reported in [`ApplyOutcome::failure`], not as an `Err`, so that the
/// results of completed work stay available to the caller.
pub async fn apply_change_set<T, C>(change_set: &ChangeSet<T>, client: Arc<C>, config: &ApplyConfig) -> ApplyOutcome<T>
where
  T: Item,
  C: ItemClient<T> + ?Sized + 'static,
{
  let (create, update, delete) = change_set.counts();
  info!(
    kind = T::KIND,
    create,
    update,
    delete,
    parallelism = config.parallelism,
    "starting apply"
  );

  let mut outcome = ApplyOutcome::default();

  // Create semaphore for parallelism control
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));

  for phase in Phase::ORDER {
    let bucket = change_set.bucket(phase);
    let items = count_items(bucket);

    if items == 0 {
      outcome.completed.push(phase);
      continue;
    }

    info!(phase = %phase, repositories = bucket.len(), items, "starting phase");

    let report = run_phase(phase, bucket, &client, config, semaphore.clone()).await;
    *outcome.results_mut(phase) = report.completed;

    if !report.failures.is_empty() {
      error!(
        phase = %phase,
        failed = report.failures.len(),
        succeeded = items - report.failures.len(),
        "phase failed, skipping remaining phases"
      );
      outcome.failure = Some(PhaseFailure {
        phase,
        failures: report.failures,
      });
      break;
    }

    info!(phase = %phase, items, "phase complete");
    outcome.completed.push(phase);
  }

  info!(
    deleted = count_items(&outcome.deleted),
    updated = count_items(&outcome.updated),
    created = count_items(&outcome.created),
    success = outcome.is_success(),
    "apply complete"
  );

  outcome
}
