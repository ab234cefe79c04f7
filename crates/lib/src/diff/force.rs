//! Forced update selection.
//!
//! An operator can ask for every known item to be re-sent, for example when
//! the remote holds a field that cannot be read back for comparison. The
//! forced bucket ignores configuration equality entirely.

use tracing::debug;

use crate::item::Item;
use crate::repository::RepositoryItems;

use super::items::{index_by_id, is_indexed};
use super::keys::RepositoryKeys;

/// Select, per repository present on both sides, every desired item whose id
/// the current state also carries.
///
/// The result is always a superset of the ordinary update bucket for the
/// same inputs.
pub fn force_update_bucket<T: Item>(
  source: &[RepositoryItems<T>],
  target: &[RepositoryItems<T>],
) -> Vec<RepositoryItems<T>> {
  let keys = RepositoryKeys::map(source, target);
  let mut bucket = Vec::new();

  for repository in &keys.keys {
    let (Some(current), Some(desired)) = (keys.source.get(repository), keys.target.get(repository)) else {
      continue;
    };

    let current_by_id = index_by_id(repository, "current", current);
    let desired_by_id = index_by_id(repository, "desired", desired);

    let selected: Vec<T> = desired
      .iter()
      .filter(|item| {
        item
          .id()
          .is_some_and(|id| is_indexed(&desired_by_id, id, *item) && current_by_id.contains_key(&id))
      })
      .cloned()
      .collect();

    if !selected.is_empty() {
      debug!(repository = %repository, items = selected.len(), "forcing update");
      bucket.push(RepositoryItems::new((*repository).clone(), selected));
    }
  }

  bucket
}
