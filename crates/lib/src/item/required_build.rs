use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Item, RefMatcher};

/// A merge check requiring successful builds before a pull request can merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredBuild {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<u64>,
  /// Build keys that must report success. Order is not significant.
  pub build_parent_keys: Vec<String>,
  pub ref_matcher: RefMatcher,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exempt_ref_matcher: Option<RefMatcher>,
}

impl Item for RequiredBuild {
  const KIND: &'static str = "required build";

  fn id(&self) -> Option<u64> {
    self.id
  }

  fn set_id(&mut self, id: Option<u64>) {
    self.id = id;
  }

  fn same_config(&self, other: &Self) -> bool {
    self.ref_matcher == other.ref_matcher
      && self.exempt_ref_matcher == other.exempt_ref_matcher
      && self.build_parent_keys.iter().collect::<BTreeSet<_>>()
        == other.build_parent_keys.iter().collect::<BTreeSet<_>>()
  }

  fn sort_label(&self) -> String {
    self.ref_matcher.id.clone()
  }
}
