use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Item, RefMatcher};

/// A default-reviewer condition: who is added to pull requests between two refs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerGroup {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<u64>,
  pub source_matcher: RefMatcher,
  pub target_matcher: RefMatcher,
  /// User names. Order is not significant.
  #[serde(default)]
  pub reviewers: Vec<String>,
  #[serde(default)]
  pub required_approvals: u32,
}

impl Item for ReviewerGroup {
  const KIND: &'static str = "reviewer group";

  fn id(&self) -> Option<u64> {
    self.id
  }

  fn set_id(&mut self, id: Option<u64>) {
    self.id = id;
  }

  fn same_config(&self, other: &Self) -> bool {
    self.source_matcher == other.source_matcher
      && self.target_matcher == other.target_matcher
      && self.required_approvals == other.required_approvals
      && self.reviewers.iter().collect::<BTreeSet<_>>() == other.reviewers.iter().collect::<BTreeSet<_>>()
  }

  fn sort_label(&self) -> String {
    format!("{} -> {}", self.source_matcher.id, self.target_matcher.id)
  }
}
