//! Properties every diff must satisfy, checked over a set of hand-built states.

use std::collections::HashSet;

use reposync_lib::diff::{compute_diff, force_update_bucket};
use reposync_lib::item::{Item, Webhook};
use reposync_lib::repository::RepositoryItems;

use super::common::{entry, hook};

fn cases() -> Vec<(Vec<RepositoryItems<Webhook>>, Vec<RepositoryItems<Webhook>>)> {
  vec![
    (Vec::new(), Vec::new()),
    (Vec::new(), vec![entry("r1", vec![hook(Some(1), "A"), hook(None, "B")])]),
    (vec![entry("r1", vec![hook(Some(1), "A")])], Vec::new()),
    (
      vec![entry("r1", vec![hook(Some(1), "A"), hook(Some(2), "B")])],
      vec![entry("r1", vec![hook(Some(1), "B"), hook(None, "C")])],
    ),
    (
      vec![
        entry("r1", vec![hook(Some(1), "A"), hook(Some(2), "B"), hook(Some(3), "C")]),
        entry("r2", vec![hook(Some(4), "D")]),
      ],
      vec![
        entry("r3", vec![hook(None, "E")]),
        entry("r1", vec![hook(Some(3), "C"), hook(Some(2), "B2"), hook(Some(7), "F")]),
        entry("r2", vec![hook(Some(4), "D")]),
      ],
    ),
  ]
}

fn ids(entries: &[RepositoryItems<Webhook>]) -> HashSet<(String, u64)> {
  entries
    .iter()
    .flat_map(|entry| {
      entry
        .items
        .iter()
        .filter_map(move |item| item.id().map(|id| (entry.repository.to_string(), id)))
    })
    .collect()
}

fn fully_identified(state: &[RepositoryItems<Webhook>]) -> bool {
  state.iter().all(|entry| entry.items.iter().all(|item| item.id().is_some()))
}

#[test]
fn diff_of_an_identified_state_with_itself_is_empty() {
  for state in cases().into_iter().flat_map(|(source, target)| [source, target]) {
    if fully_identified(&state) {
      assert!(compute_diff(&state, &state).is_empty());
    }
  }
}

#[test]
fn items_without_id_are_created_even_against_themselves() {
  for state in cases().into_iter().flat_map(|(source, target)| [source, target]) {
    let diff = compute_diff(&state, &state);

    assert!(diff.update.is_empty() && diff.delete.is_empty());
    let idless = state
      .iter()
      .flat_map(|entry| &entry.items)
      .filter(|item| item.id().is_none())
      .count();
    let created: usize = diff.create.iter().map(|entry| entry.items.len()).sum();
    assert_eq!(created, idless);
    assert!(diff.create.iter().flat_map(|entry| &entry.items).all(|item| item.id().is_none()));
  }
}

#[test]
fn every_target_item_is_created_updated_or_unchanged() {
  for (source, target) in cases() {
    let diff = compute_diff(&source, &target);
    let source_ids = ids(&source);

    for entry in &target {
      let repository = entry.repository.to_string();
      for item in &entry.items {
        let created = diff
          .create
          .iter()
          .any(|e| e.repository == entry.repository && e.items.contains(item));
        let updated = diff
          .update
          .iter()
          .any(|e| e.repository == entry.repository && e.items.contains(item));
        let known = item.id().is_some_and(|id| source_ids.contains(&(repository.clone(), id)));

        assert!(!(created && updated), "{} both created and updated", item.name);
        if !known {
          assert!(created, "{} should be created", item.name);
        }
      }
    }
  }
}

#[test]
fn deletes_are_exactly_the_ids_missing_from_target() {
  for (source, target) in cases() {
    let diff = compute_diff(&source, &target);
    let expected: HashSet<_> = ids(&source).difference(&ids(&target)).cloned().collect();

    assert_eq!(ids(&diff.delete), expected);
  }
}

#[test]
fn buckets_hold_one_entry_per_repository() {
  for (source, target) in cases() {
    let diff = compute_diff(&source, &target);
    for bucket in [&diff.create, &diff.update, &diff.delete] {
      let repositories: HashSet<_> = bucket.iter().map(|entry| &entry.repository).collect();
      assert_eq!(repositories.len(), bucket.len());
      assert!(bucket.iter().all(|entry| !entry.items.is_empty()));
    }
  }
}

#[test]
fn forced_updates_contain_ordinary_updates() {
  for (source, target) in cases() {
    let ordinary = ids(&compute_diff(&source, &target).update);
    let forced = ids(&force_update_bucket(&source, &target));

    assert!(ordinary.is_subset(&forced));
    assert_eq!(forced, ids(&source).intersection(&ids(&target)).cloned().collect());
  }
}
