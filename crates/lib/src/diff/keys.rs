//! Repository key mapping.
//!
//! Indexes both declared states by repository and produces the union of
//! repository keys in a deterministic order: every source key in source
//! order, then the keys only the target declares, in target order.

use std::collections::{HashMap, HashSet};

use crate::repository::{RepositoryItems, RepositoryRef};

/// Both states indexed by repository, plus the ordered key union.
#[derive(Debug)]
pub struct RepositoryKeys<'a, T> {
  pub source: HashMap<&'a RepositoryRef, &'a [T]>,
  pub target: HashMap<&'a RepositoryRef, &'a [T]>,
  pub keys: Vec<&'a RepositoryRef>,
}

impl<'a, T> RepositoryKeys<'a, T> {
  /// Index `source` and `target`.
  ///
  /// A repository listed twice in one state is indexed by its later entry.
  pub fn map(source: &'a [RepositoryItems<T>], target: &'a [RepositoryItems<T>]) -> Self {
    let source_index = index(source);
    let target_index = index(target);

    let mut seen: HashSet<&RepositoryRef> = HashSet::with_capacity(source_index.len() + target_index.len());
    let mut keys = Vec::with_capacity(source_index.len() + target_index.len());

    for entry in source.iter().chain(target.iter()) {
      if seen.insert(&entry.repository) {
        keys.push(&entry.repository);
      }
    }

    Self {
      source: source_index,
      target: target_index,
      keys,
    }
  }
}

fn index<T>(state: &[RepositoryItems<T>]) -> HashMap<&RepositoryRef, &[T]> {
  state
    .iter()
    .map(|entry| (&entry.repository, entry.items.as_slice()))
    .collect()
}
