//! Repository identity and per-repository item collections.
//!
//! Every piece of configuration reposync manages lives inside a repository,
//! addressed by its project key and slug. A declared state is an ordered list
//! of [`RepositoryItems`] entries, one per repository.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Identity of a repository-scoped configuration target.
///
/// Ordered by `(project, slug)`, which is the order plan documents use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryRef {
  pub project: String,
  pub slug: String,
}

impl RepositoryRef {
  pub fn new(project: impl Into<String>, slug: impl Into<String>) -> Self {
    Self {
      project: project.into(),
      slug: slug.into(),
    }
  }
}

impl fmt::Display for RepositoryRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.project, self.slug)
  }
}

/// The items of one domain that belong to one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct RepositoryItems<T> {
  pub repository: RepositoryRef,
  #[serde(default)]
  pub items: Vec<T>,
}

impl<T> RepositoryItems<T> {
  pub fn new(repository: RepositoryRef, items: Vec<T>) -> Self {
    Self { repository, items }
  }
}

/// A "current" or "desired" configuration: repository entries in declaration order.
pub type DeclaredState<T> = Vec<RepositoryItems<T>>;

/// Total number of items across all entries.
pub fn count_items<T>(entries: &[RepositoryItems<T>]) -> usize {
  entries.iter().map(|entry| entry.items.len()).sum()
}

/// Bring a bucket into its canonical order.
///
/// Entries for the same repository are merged (keeping item order), entries
/// are sorted by repository, and items within an entry are sorted by id.
/// Items without an id sort first; ties fall back to [`Item::sort_label`]
/// and then to the item's serialized form, so equal buckets always end up
/// in the same order.
pub fn normalize_entries<T: Item>(entries: &mut Vec<RepositoryItems<T>>) {
  let mut merged: Vec<RepositoryItems<T>> = Vec::with_capacity(entries.len());
  let mut positions: HashMap<RepositoryRef, usize> = HashMap::new();

  for entry in entries.drain(..) {
    match positions.get(&entry.repository) {
      Some(&pos) => merged[pos].items.extend(entry.items),
      None => {
        positions.insert(entry.repository.clone(), merged.len());
        merged.push(entry);
      }
    }
  }

  merged.sort_by(|a, b| a.repository.cmp(&b.repository));
  for entry in &mut merged {
    entry
      .items
      .sort_by_cached_key(|item| (item.id(), item.sort_label(), serde_json::to_string(item).unwrap_or_default()));
  }

  *entries = merged;
}
