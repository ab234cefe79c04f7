//! Per-repository item classification.

use std::collections::HashMap;

use tracing::warn;

use crate::item::Item;
use crate::repository::{RepositoryItems, RepositoryRef};

/// Classification of one repository's items.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDiff<T> {
  pub create: Vec<T>,
  pub update: Vec<T>,
  pub delete: Vec<T>,
}

impl<T> ItemDiff<T> {
  pub fn is_empty(&self) -> bool {
    self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
  }
}

impl<T> Default for ItemDiff<T> {
  fn default() -> Self {
    Self {
      create: Vec::new(),
      update: Vec::new(),
      delete: Vec::new(),
    }
  }
}

/// Classify `target` against `source` for one repository.
///
/// - Delete: source items whose id does not appear in target.
/// - Create: target items without an id, and target items whose id does not
///   appear in source.
/// - Update: target items whose id appears on both sides and whose
///   configuration differs under [`Item::same_config`].
///
/// When one side carries the same id twice, the later item wins the id
/// lookup and every earlier item with that id is dropped from the result
/// entirely: it lands in no bucket, not even create or delete.
pub fn diff_items<T: Item>(repository: &RepositoryRef, source: &[T], target: &[T]) -> ItemDiff<T> {
  let source_by_id = index_by_id(repository, "current", source);
  let target_by_id = index_by_id(repository, "desired", target);

  let mut diff = ItemDiff::default();

  for item in source {
    if let Some(id) = item.id()
      && is_indexed(&source_by_id, id, item)
      && !target_by_id.contains_key(&id)
    {
      diff.delete.push(item.clone());
    }
  }

  for item in target {
    let Some(id) = item.id() else {
      diff.create.push(item.clone());
      continue;
    };

    if !is_indexed(&target_by_id, id, item) {
      continue;
    }

    match source_by_id.get(&id) {
      None => diff.create.push(item.clone()),
      Some(current) if !current.same_config(item) => diff.update.push(item.clone()),
      Some(_) => {}
    }
  }

  diff
}

/// Index items by id, later items overwriting earlier ones.
pub(crate) fn index_by_id<'a, T: Item>(repository: &RepositoryRef, side: &str, items: &'a [T]) -> HashMap<u64, &'a T> {
  let mut index = HashMap::with_capacity(items.len());
  for item in items {
    if let Some(id) = item.id()
      && index.insert(id, item).is_some()
    {
      warn!(
        repository = %repository,
        side,
        kind = T::KIND,
        id,
        "duplicate id, the later item takes precedence"
      );
    }
  }
  index
}

/// True if `item` is the entry that survived indexing for `id`.
pub(crate) fn is_indexed<T>(index: &HashMap<u64, &T>, id: u64, item: &T) -> bool {
  index.get(&id).is_some_and(|indexed| std::ptr::eq(*indexed, item))
}

/// Every `(repository, id)` pair that occurs more than once in `state`.
pub fn find_duplicate_ids<T: Item>(state: &[RepositoryItems<T>]) -> Vec<(RepositoryRef, u64)> {
  let mut duplicates = Vec::new();
  for entry in state {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for id in entry.items.iter().filter_map(|item| item.id()) {
      let count = counts.entry(id).or_default();
      *count += 1;
      if *count == 2 {
        duplicates.push((entry.repository.clone(), id));
      }
    }
  }
  duplicates
}
