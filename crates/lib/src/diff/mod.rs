//! Diff computation between declared states.
//!
//! This module compares a current declared state against a desired one and
//! classifies every item into one of three independent buckets: create,
//! update or delete. Diffing is pure: it never touches the remote and never
//! fails on well-formed input.
//!
//! # Repository-level rules
//!
//! - Repository only in desired → all of its items are created.
//! - Repository only in current → all of its items are deleted.
//! - Repository in both → items are classified by [`diff_items`].

pub mod force;
pub mod items;
pub mod keys;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::execute::Phase;
use crate::item::Item;
use crate::repository::{RepositoryItems, RepositoryRef, count_items, normalize_entries};

pub use force::force_update_bucket;
pub use items::{ItemDiff, diff_items, find_duplicate_ids};
pub use keys::RepositoryKeys;

/// Mutations required to turn the current state into the desired one.
///
/// A repository may appear in several buckets, but at most once per bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct ChangeSet<T> {
  #[serde(default)]
  pub create: Vec<RepositoryItems<T>>,
  #[serde(default)]
  pub update: Vec<RepositoryItems<T>>,
  #[serde(default)]
  pub delete: Vec<RepositoryItems<T>>,
}

impl<T> Default for ChangeSet<T> {
  fn default() -> Self {
    Self {
      create: Vec::new(),
      update: Vec::new(),
      delete: Vec::new(),
    }
  }
}

impl<T> ChangeSet<T> {
  /// Returns true if there is nothing to apply.
  pub fn is_empty(&self) -> bool {
    count_items(&self.create) == 0 && count_items(&self.update) == 0 && count_items(&self.delete) == 0
  }

  /// The bucket executed during `phase`.
  pub fn bucket(&self, phase: Phase) -> &[RepositoryItems<T>] {
    match phase {
      Phase::Delete => &self.delete,
      Phase::Update => &self.update,
      Phase::Create => &self.create,
    }
  }

  /// Item counts as `(create, update, delete)`.
  pub fn counts(&self) -> (usize, usize, usize) {
    (count_items(&self.create), count_items(&self.update), count_items(&self.delete))
  }
}

impl<T: Item> ChangeSet<T> {
  /// Replace the update bucket with every item whose id the current state already knows.
  ///
  /// Used to force a full resync when some remote field cannot be compared
  /// locally. The create and delete buckets are left untouched.
  pub fn with_forced_updates(mut self, source: &[RepositoryItems<T>], target: &[RepositoryItems<T>]) -> Self {
    self.update = force_update_bucket(source, target);
    self
  }

  /// Sort every bucket into canonical order (see [`normalize_entries`]).
  pub fn normalize(&mut self) {
    normalize_entries(&mut self.create);
    normalize_entries(&mut self.update);
    normalize_entries(&mut self.delete);
  }
}

/// Compute the change set between `source` (current) and `target` (desired).
///
/// Repositories are visited in the order given by [`RepositoryKeys`], so the
/// same inputs always produce the same bucket order.
pub fn compute_diff<T: Item>(source: &[RepositoryItems<T>], target: &[RepositoryItems<T>]) -> ChangeSet<T> {
  let keys = RepositoryKeys::map(source, target);
  let mut change_set = ChangeSet::default();

  for repository in &keys.keys {
    let current = keys.source.get(repository).copied();
    let desired = keys.target.get(repository).copied();

    match (current, desired) {
      (None, Some(desired)) => {
        if !desired.is_empty() {
          debug!(repository = %repository, items = desired.len(), "repository is new");
          change_set.create.push(RepositoryItems::new((*repository).clone(), desired.to_vec()));
        }
      }
      (Some(current), None) => {
        if !current.is_empty() {
          debug!(repository = %repository, items = current.len(), "repository is no longer declared");
          change_set.delete.push(RepositoryItems::new((*repository).clone(), current.to_vec()));
        }
      }
      (Some(current), Some(desired)) => {
        let ItemDiff { create, update, delete } = diff_items(repository, current, desired);
        debug!(
          repository = %repository,
          create = create.len(),
          update = update.len(),
          delete = delete.len(),
          "repository diffed"
        );
        push_non_empty(&mut change_set.create, repository, create);
        push_non_empty(&mut change_set.update, repository, update);
        push_non_empty(&mut change_set.delete, repository, delete);
      }
      (None, None) => {}
    }
  }

  change_set
}

fn push_non_empty<T>(bucket: &mut Vec<RepositoryItems<T>>, repository: &RepositoryRef, items: Vec<T>) {
  if !items.is_empty() {
    bucket.push(RepositoryItems::new(repository.clone(), items));
  }
}
