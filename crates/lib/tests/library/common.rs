//! Shared builders for library tests.

use reposync_lib::item::Webhook;
use reposync_lib::repository::{DeclaredState, RepositoryItems, RepositoryRef};

/// A webhook whose url is derived from its name.
pub fn hook(id: Option<u64>, name: &str) -> Webhook {
  let mut hook = Webhook::new(name, format!("https://hooks.example.com/{}", name));
  hook.id = id;
  hook
}

pub fn entry(slug: &str, items: Vec<Webhook>) -> RepositoryItems<Webhook> {
  RepositoryItems::new(RepositoryRef::new("P", slug), items)
}

/// Every `(repository, name)` pair, sorted, ignoring ids.
pub fn names(state: &DeclaredState<Webhook>) -> Vec<(String, String)> {
  let mut names: Vec<_> = state
    .iter()
    .flat_map(|entry| {
      entry
        .items
        .iter()
        .map(move |hook| (entry.repository.to_string(), hook.name.clone()))
    })
    .collect();
  names.sort();
  names
}
