//! Rollback plan construction.
//!
//! A rollback plan inverts an applied change set:
//!
//! - items that were created are deleted again (by their returned ids),
//! - updated items are set back to their value in the pre-apply state,
//! - deleted items are created again.
//!
//! Recreated items receive new ids from the remote, so a rollback restores
//! equivalent configuration, not identical identity.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::diff::ChangeSet;
use crate::diff::items::index_by_id;
use crate::execute::{ApplyConfig, ApplyOutcome, ItemClient, Phase, apply_change_set};
use crate::item::{Item, describe};
use crate::repository::{RepositoryItems, RepositoryRef, count_items, normalize_entries};

/// Inverse of an applied change set. Executed with the same phase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct RollbackPlan<T> {
  #[serde(default)]
  pub delete: Vec<RepositoryItems<T>>,
  #[serde(default)]
  pub update: Vec<RepositoryItems<T>>,
  #[serde(default)]
  pub create: Vec<RepositoryItems<T>>,
}

impl<T> Default for RollbackPlan<T> {
  fn default() -> Self {
    Self {
      delete: Vec::new(),
      update: Vec::new(),
      create: Vec::new(),
    }
  }
}

impl<T> RollbackPlan<T> {
  pub fn is_empty(&self) -> bool {
    count_items(&self.delete) == 0 && count_items(&self.update) == 0 && count_items(&self.create) == 0
  }
}

impl<T: Item> RollbackPlan<T> {
  pub fn normalize(&mut self) {
    normalize_entries(&mut self.delete);
    normalize_entries(&mut self.update);
    normalize_entries(&mut self.create);
  }
}

impl<T> From<RollbackPlan<T>> for ChangeSet<T> {
  fn from(plan: RollbackPlan<T>) -> Self {
    ChangeSet {
      create: plan.create,
      update: plan.update,
      delete: plan.delete,
    }
  }
}

/// Build the plan that undoes `applied`, given what `outcome` says happened.
///
/// `source` is the pre-apply current state. Only phases that actually did
/// work are inverted, so a plan built from a failed apply undoes exactly the
/// operations that succeeded.
pub fn build_rollback_plan<T: Item>(
  source: &[RepositoryItems<T>],
  applied: &ChangeSet<T>,
  outcome: &ApplyOutcome<T>,
) -> RollbackPlan<T> {
  let mut plan = RollbackPlan {
    delete: created_items(&outcome.created),
    update: original_values(source, &outcome.updated),
    create: deleted_items(applied, outcome),
  };
  plan.normalize();

  info!(
    delete = count_items(&plan.delete),
    update = count_items(&plan.update),
    create = count_items(&plan.create),
    "rollback plan built"
  );

  plan
}

/// Execute `plan` through `client`. Rollback uses the apply executor unchanged.
pub async fn execute_rollback<T, C>(plan: RollbackPlan<T>, client: Arc<C>, config: &ApplyConfig) -> ApplyOutcome<T>
where
  T: Item,
  C: ItemClient<T> + ?Sized + 'static,
{
  apply_change_set(&ChangeSet::from(plan), client, config).await
}

/// Created items can only be deleted again if the remote told us their id.
fn created_items<T: Item>(created: &[RepositoryItems<T>]) -> Vec<RepositoryItems<T>> {
  created
    .iter()
    .filter_map(|entry| {
      let items: Vec<T> = entry
        .items
        .iter()
        .filter(|item| {
          let known = item.id().is_some();
          if !known {
            warn!(repository = %entry.repository, item = %describe(*item), "created item has no id, cannot roll it back");
          }
          known
        })
        .cloned()
        .collect();
      (!items.is_empty()).then(|| RepositoryItems::new(entry.repository.clone(), items))
    })
    .collect()
}

fn original_values<T: Item>(source: &[RepositoryItems<T>], updated: &[RepositoryItems<T>]) -> Vec<RepositoryItems<T>> {
  let mut by_repository: HashMap<&RepositoryRef, HashMap<u64, &T>> = HashMap::new();
  for entry in source {
    by_repository
      .entry(&entry.repository)
      .or_default()
      .extend(index_by_id(&entry.repository, "current", &entry.items));
  }

  let mut restored = Vec::new();
  for entry in updated {
    let originals = by_repository.get(&entry.repository);
    let mut items = Vec::new();

    for item in &entry.items {
      let original = item
        .id()
        .and_then(|id| originals.and_then(|originals| originals.get(&id)));
      match original {
        Some(original) => items.push((*original).clone()),
        None => warn!(
          repository = %entry.repository,
          item = %describe(item),
          "original value not found in current state, skipping"
        ),
      }
    }

    if !items.is_empty() {
      restored.push(RepositoryItems::new(entry.repository.clone(), items));
    }
  }
  restored
}

/// The delete bucket of `applied` when that phase completed, otherwise only
/// the deletes the outcome confirms.
fn deleted_items<T: Item>(applied: &ChangeSet<T>, outcome: &ApplyOutcome<T>) -> Vec<RepositoryItems<T>> {
  if outcome.completed.contains(&Phase::Delete) {
    applied.delete.clone()
  } else {
    outcome.deleted.clone()
  }
}
