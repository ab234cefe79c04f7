//! Declared-state documents.
//!
//! A state document lists repositories with the configuration declared for
//! each of them, for every item domain at once:
//!
//! ```yaml
//! repositories:
//!   - project: PLAT
//!     slug: api
//!     webhooks:
//!       - id: 4
//!         name: ci
//!         url: https://ci.example.com/hook
//!     required_builds: []
//! ```
//!
//! The diff engine works on one domain at a time; [`StateDocument::declared`]
//! projects the document onto the domain being reconciled.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::diff::find_duplicate_ids;
use crate::item::{Item, RequiredBuild, ReviewerGroup, Webhook};
use crate::plan::format::{self, DocumentError, DocumentFormat};
use crate::repository::{DeclaredState, RepositoryItems, RepositoryRef};

/// Errors loading or saving a state document.
#[derive(Debug, Error)]
pub enum StateError {
  #[error("invalid state document {}: {source}", .path.display())]
  Document {
    path: std::path::PathBuf,
    #[source]
    source: DocumentError,
  },

  /// Strict mode found an id declared twice in one repository.
  #[error("duplicate {kind} ids: {}", .duplicates.join(", "))]
  DuplicateIds { kind: &'static str, duplicates: Vec<String> },
}

/// Root of a declared-state document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
  pub repositories: Vec<RepositoryConfig>,
  /// Highest id ever issued per domain collection. Only a remote document
  /// carries this; it never decreases, so deleted ids are not handed out again.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub last_ids: BTreeMap<String, u64>,
}

/// Everything declared for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
  pub project: String,
  pub slug: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub webhooks: Vec<Webhook>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub required_builds: Vec<RequiredBuild>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub reviewer_groups: Vec<ReviewerGroup>,
}

impl RepositoryConfig {
  pub fn new(repository: &RepositoryRef) -> Self {
    Self {
      project: repository.project.clone(),
      slug: repository.slug.clone(),
      webhooks: Vec::new(),
      required_builds: Vec::new(),
      reviewer_groups: Vec::new(),
    }
  }

  pub fn repository(&self) -> RepositoryRef {
    RepositoryRef::new(&self.project, &self.slug)
  }

  pub fn matches(&self, repository: &RepositoryRef) -> bool {
    self.project == repository.project && self.slug == repository.slug
  }

  /// The items of one domain, as a diffable entry.
  pub fn project<T: StateItem>(&self) -> RepositoryItems<T> {
    RepositoryItems::new(self.repository(), T::collection(self).to_vec())
  }
}

/// An item domain stored in [`RepositoryConfig`].
pub trait StateItem: Item {
  /// Field name of the domain's collection in a repository entry.
  const COLLECTION: &'static str;

  fn collection(config: &RepositoryConfig) -> &Vec<Self>;

  fn collection_mut(config: &mut RepositoryConfig) -> &mut Vec<Self>;
}

impl StateItem for Webhook {
  const COLLECTION: &'static str = "webhooks";

  fn collection(config: &RepositoryConfig) -> &Vec<Self> {
    &config.webhooks
  }

  fn collection_mut(config: &mut RepositoryConfig) -> &mut Vec<Self> {
    &mut config.webhooks
  }
}

impl StateItem for RequiredBuild {
  const COLLECTION: &'static str = "required_builds";

  fn collection(config: &RepositoryConfig) -> &Vec<Self> {
    &config.required_builds
  }

  fn collection_mut(config: &mut RepositoryConfig) -> &mut Vec<Self> {
    &mut config.required_builds
  }
}

impl StateItem for ReviewerGroup {
  const COLLECTION: &'static str = "reviewer_groups";

  fn collection(config: &RepositoryConfig) -> &Vec<Self> {
    &config.reviewer_groups
  }

  fn collection_mut(config: &mut RepositoryConfig) -> &mut Vec<Self> {
    &mut config.reviewer_groups
  }
}

impl StateDocument {
  /// Load a state document from `path`, accepting JSON or YAML.
  pub fn load(path: &Path) -> Result<Self, StateError> {
    let wrap = |source| StateError::Document {
      path: path.to_path_buf(),
      source,
    };

    let content = format::read_text(path).map_err(wrap)?;
    let document: StateDocument = format::decode(&content).map_err(wrap)?;
    debug!(path = %path.display(), repositories = document.repositories.len(), "state loaded");
    Ok(document)
  }

  /// Parse a state document from a string.
  pub fn parse(content: &str) -> Result<Self, DocumentError> {
    format::decode(content)
  }

  /// Save atomically, in the encoding the extension implies.
  pub fn save(&self, path: &Path) -> Result<(), StateError> {
    let wrap = |source| StateError::Document {
      path: path.to_path_buf(),
      source,
    };

    let content = format::encode(self, DocumentFormat::from_path(path)).map_err(wrap)?;
    format::write_atomic(path, &content).map_err(wrap)
  }

  /// Project the document onto one item domain, keeping repository order.
  pub fn declared<T: StateItem>(&self) -> DeclaredState<T> {
    self.repositories.iter().map(RepositoryConfig::project).collect()
  }

  /// The entry for `repository`, added at the end if absent.
  pub fn ensure_repository(&mut self, repository: &RepositoryRef) -> &mut RepositoryConfig {
    let pos = match self.repositories.iter().position(|config| config.matches(repository)) {
      Some(pos) => pos,
      None => {
        self.repositories.push(RepositoryConfig::new(repository));
        self.repositories.len() - 1
      }
    };
    &mut self.repositories[pos]
  }

  pub fn repository_mut(&mut self, repository: &RepositoryRef) -> Option<&mut RepositoryConfig> {
    self.repositories.iter_mut().find(|config| config.matches(repository))
  }

  /// Raise the id high-water mark of every domain to the ids present.
  pub fn reserve_present_ids(&mut self) {
    self.reserve_present::<Webhook>();
    self.reserve_present::<RequiredBuild>();
    self.reserve_present::<ReviewerGroup>();
  }

  fn reserve_present<T: StateItem>(&mut self) {
    let present = self
      .repositories
      .iter()
      .flat_map(|config| T::collection(config))
      .filter_map(|item| item.id())
      .max();
    if let Some(present) = present {
      let last = self.last_ids.entry(T::COLLECTION.to_string()).or_default();
      *last = (*last).max(present);
    }
  }

  /// Issue the next id of a domain. Ids are never reused.
  pub fn issue_id<T: StateItem>(&mut self) -> u64 {
    self.reserve_present::<T>();
    let last = self.last_ids.entry(T::COLLECTION.to_string()).or_default();
    *last += 1;
    *last
  }
}

/// Reject states that declare an id twice within one repository.
///
/// Without this check the later item silently wins during diffing.
pub fn check_unique_ids<T: Item>(state: &[RepositoryItems<T>]) -> Result<(), StateError> {
  let duplicates = find_duplicate_ids(state);
  if duplicates.is_empty() {
    return Ok(());
  }

  for (repository, id) in &duplicates {
    warn!(repository = %repository, kind = T::KIND, id, "id declared more than once");
  }

  Err(StateError::DuplicateIds {
    kind: T::KIND,
    duplicates: duplicates
      .iter()
      .map(|(repository, id)| format!("{} #{}", repository, id))
      .collect(),
  })
}
