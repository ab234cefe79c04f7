use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Item;

fn default_true() -> bool {
  true
}

/// A repository webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<u64>,
  pub name: String,
  pub url: String,
  #[serde(default = "default_true")]
  pub active: bool,
  /// Event keys, e.g. `repo:refs_changed`. Order is not significant.
  #[serde(default)]
  pub events: Vec<String>,
  #[serde(default = "default_true")]
  pub ssl_verification_required: bool,
  /// Shared signing secret. Write-only: the remote never returns it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub secret: Option<String>,
}

impl Webhook {
  pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
    Self {
      id: None,
      name: name.into(),
      url: url.into(),
      active: true,
      events: Vec::new(),
      ssl_verification_required: true,
      secret: None,
    }
  }

  #[cfg(test)]
  pub(crate) fn named(id: Option<u64>, name: &str) -> Self {
    let mut hook = Self::new(name, format!("https://hooks.example.com/{}", name));
    hook.id = id;
    hook
  }
}

impl Item for Webhook {
  const KIND: &'static str = "webhook";

  fn id(&self) -> Option<u64> {
    self.id
  }

  fn set_id(&mut self, id: Option<u64>) {
    self.id = id;
  }

  fn same_config(&self, other: &Self) -> bool {
    self.name == other.name
      && self.url == other.url
      && self.active == other.active
      && self.ssl_verification_required == other.ssl_verification_required
      && self.events.iter().collect::<BTreeSet<_>>() == other.events.iter().collect::<BTreeSet<_>>()
  }

  fn sort_label(&self) -> String {
    self.name.clone()
  }
}
