use serde::{Deserialize, Serialize};

/// How a [`RefMatcher`] interprets its id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatcherKind {
  #[default]
  Branch,
  Pattern,
  ModelBranch,
  ModelCategory,
  Any,
}

/// Selects the branches a condition applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefMatcher {
  pub id: String,
  #[serde(rename = "type", default)]
  pub kind: MatcherKind,
}

impl RefMatcher {
  pub fn branch(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      kind: MatcherKind::Branch,
    }
  }

  pub fn any() -> Self {
    Self {
      id: "ANY_REF_MATCHER_ID".to_string(),
      kind: MatcherKind::Any,
    }
  }
}
