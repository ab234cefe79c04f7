//! Types for change set execution.
//!
//! This module defines the phases, configuration, outcome and error types
//! used when applying a change set through an [`ItemClient`].
//!
//! [`ItemClient`]: super::ItemClient

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::{RepositoryItems, RepositoryRef, count_items};

use super::client::ClientError;

/// One apply phase. Phases always run in [`Phase::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
  Delete,
  Update,
  Create,
}

impl Phase {
  /// Deletes run first so that a create never collides with a name still
  /// held by an item that is about to be removed.
  pub const ORDER: [Phase; 3] = [Phase::Delete, Phase::Update, Phase::Create];
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Phase::Delete => write!(f, "delete"),
      Phase::Update => write!(f, "update"),
      Phase::Create => write!(f, "create"),
    }
  }
}

/// A single item operation that did not succeed.
#[derive(Debug)]
pub struct ItemFailure {
  pub repository: RepositoryRef,
  /// Output of [`crate::item::describe`] for the item.
  pub item: String,
  pub error: ClientError,
}

impl fmt::Display for ItemFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}: {}", self.repository, self.item, self.error)
  }
}

/// The phase that stopped an apply, with every item that failed in it.
#[derive(Debug)]
pub struct PhaseFailure {
  pub phase: Phase,
  pub failures: Vec<ItemFailure>,
}

/// Result of applying a change set.
///
/// Holds what each phase actually did, grouped by repository in the order
/// of the applied buckets. If a phase failed, `failure` names it; phases
/// after it were never started.
#[derive(Debug)]
pub struct ApplyOutcome<T> {
  /// Items the remote confirmed as deleted.
  pub deleted: Vec<RepositoryItems<T>>,

  /// Items as returned by the remote after updating.
  pub updated: Vec<RepositoryItems<T>>,

  /// Items as returned by the remote after creating, carrying their new ids.
  pub created: Vec<RepositoryItems<T>>,

  /// Phases that ran to completion without failures.
  pub completed: Vec<Phase>,

  pub failure: Option<PhaseFailure>,
}

impl<T> Default for ApplyOutcome<T> {
  fn default() -> Self {
    Self {
      deleted: Vec::new(),
      updated: Vec::new(),
      created: Vec::new(),
      completed: Vec::new(),
      failure: None,
    }
  }
}

impl<T> ApplyOutcome<T> {
  /// Returns true if every phase completed.
  pub fn is_success(&self) -> bool {
    self.failure.is_none()
  }

  /// Total number of item operations that succeeded.
  pub fn total(&self) -> usize {
    count_items(&self.deleted) + count_items(&self.updated) + count_items(&self.created)
  }

  pub(crate) fn results_mut(&mut self, phase: Phase) -> &mut Vec<RepositoryItems<T>> {
    match phase {
      Phase::Delete => &mut self.deleted,
      Phase::Update => &mut self.updated,
      Phase::Create => &mut self.created,
    }
  }

  /// The error describing the failed phase, if any.
  pub fn error(&self) -> Option<ApplyError> {
    self.failure.as_ref().map(|failure| ApplyError::PhaseFailed {
      phase: failure.phase,
      failed: failure.failures.iter().map(ToString::to_string).collect(),
    })
  }

  /// Items that were created or updated, for the apply-result document.
  pub fn applied(&self) -> AppliedItems<T>
  where
    T: Clone,
  {
    AppliedItems {
      created: self.created.clone(),
      updated: self.updated.clone(),
    }
  }
}

/// Created and updated items of an apply, as written to the apply-result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct AppliedItems<T> {
  #[serde(default)]
  pub created: Vec<RepositoryItems<T>>,
  #[serde(default)]
  pub updated: Vec<RepositoryItems<T>>,
}

/// Errors surfaced by an apply.
#[derive(Debug, Error)]
pub enum ApplyError {
  /// At least one item in a phase failed; later phases did not run.
  #[error("{phase} phase failed for {} item(s): {}", failed.len(), failed.join("; "))]
  PhaseFailed { phase: Phase, failed: Vec<String> },
}

/// Configuration for change set execution.
#[derive(Debug, Clone)]
pub struct ApplyConfig {
  /// Maximum number of collaborator calls in flight, shared by all phases.
  pub parallelism: usize,

  /// Upper bound for a single collaborator call. `None` waits indefinitely.
  pub call_timeout: Option<Duration>,
}

impl Default for ApplyConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      call_timeout: None,
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
