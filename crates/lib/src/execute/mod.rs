//! Change set execution module.
//!
//! This module applies a change set through an [`ItemClient`]. It handles:
//! - Fixed phase ordering (delete, then update, then create)
//! - Bounded parallelism within a phase
//! - A barrier between phases
//! - Failure collection (a failed phase drains, later phases are skipped)

pub mod apply;
pub mod client;
pub mod types;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::item::{Item, describe};
use crate::repository::{RepositoryItems, RepositoryRef};

pub use apply::apply_change_set;
pub use client::{ClientError, ItemClient};
pub use types::{AppliedItems, ApplyConfig, ApplyError, ApplyOutcome, ItemFailure, Phase, PhaseFailure};

/// What one phase produced.
#[derive(Debug)]
pub(crate) struct PhaseReport<T> {
  /// Successful results grouped by repository, in bucket order.
  pub completed: Vec<RepositoryItems<T>>,
  pub failures: Vec<ItemFailure>,
}

type TaskOutput<T> = (usize, usize, Result<T, ClientError>);

/// Run every item operation of `bucket` and wait for all of them.
///
/// Each item becomes one task; the shared semaphore bounds how many talk to
/// the client at once. Results are slotted back by (entry, item) position,
/// so completion order has no effect on the report.
pub(crate) async fn run_phase<T, C>(
  phase: Phase,
  bucket: &[RepositoryItems<T>],
  client: &Arc<C>,
  config: &ApplyConfig,
  semaphore: Arc<Semaphore>,
) -> PhaseReport<T>
where
  T: Item,
  C: ItemClient<T> + ?Sized + 'static,
{
  let mut join_set: JoinSet<TaskOutput<T>> = JoinSet::new();

  for (entry_idx, entry) in bucket.iter().enumerate() {
    for (item_idx, item) in entry.items.iter().enumerate() {
      let client = Arc::clone(client);
      let semaphore = semaphore.clone();
      let repository = entry.repository.clone();
      let item = item.clone();
      let call_timeout = config.call_timeout;

      join_set.spawn(async move {
        // Acquire semaphore permit inside the task
        let Ok(_permit) = semaphore.acquire().await else {
          return (entry_idx, item_idx, Err(ClientError::Aborted));
        };

        debug!(phase = %phase, repository = %repository, item = %describe(&item), "calling remote");

        let call = invoke(phase, client.as_ref(), &repository, &item);
        let result = match call_timeout {
          Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(limit)),
          },
          None => call.await,
        };

        (entry_idx, item_idx, result)
      });
    }
  }

  let mut slots: Vec<Vec<Option<Result<T, ClientError>>>> = bucket
    .iter()
    .map(|entry| entry.items.iter().map(|_| None).collect())
    .collect();

  while let Some(join_result) = join_set.join_next().await {
    match join_result {
      Ok((entry_idx, item_idx, result)) => slots[entry_idx][item_idx] = Some(result),
      Err(e) => error!(phase = %phase, error = %e, "worker task panicked"),
    }
  }

  collect_report(phase, bucket, slots)
}

fn collect_report<T: Item>(
  phase: Phase,
  bucket: &[RepositoryItems<T>],
  slots: Vec<Vec<Option<Result<T, ClientError>>>>,
) -> PhaseReport<T> {
  let mut report = PhaseReport {
    completed: Vec::new(),
    failures: Vec::new(),
  };

  for (entry, entry_slots) in bucket.iter().zip(slots) {
    let mut succeeded = Vec::new();

    for (item, slot) in entry.items.iter().zip(entry_slots) {
      match slot.unwrap_or(Err(ClientError::Aborted)) {
        Ok(result) => succeeded.push(result),
        Err(e) => {
          error!(
            phase = %phase,
            repository = %entry.repository,
            item = %describe(item),
            error = %e,
            "item operation failed"
          );
          report.failures.push(ItemFailure {
            repository: entry.repository.clone(),
            item: describe(item),
            error: e,
          });
        }
      }
    }

    if !succeeded.is_empty() {
      report
        .completed
        .push(RepositoryItems::new(entry.repository.clone(), succeeded));
    }
  }

  report
}

/// Issue the one client call `phase` calls for.
///
/// A successful delete reports the item it was given.
async fn invoke<T, C>(phase: Phase, client: &C, repository: &RepositoryRef, item: &T) -> Result<T, ClientError>
where
  T: Item,
  C: ItemClient<T> + ?Sized,
{
  match phase {
    Phase::Delete => client.delete(repository, item).await.map(|()| item.clone()),
    Phase::Update => client.update(repository, item).await,
    Phase::Create => client.create(repository, item).await,
  }
}
