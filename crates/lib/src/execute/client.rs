//! The collaborator contract the executor calls out to.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::item::Item;
use crate::repository::RepositoryRef;

/// Errors reported by an [`ItemClient`] call.
#[derive(Debug, Error)]
pub enum ClientError {
  /// The repository does not exist on the remote.
  #[error("repository {0} not found")]
  RepositoryNotFound(RepositoryRef),

  /// No item with this id exists in the repository.
  #[error("{repository} has no {kind} with id {id}")]
  ItemNotFound {
    repository: RepositoryRef,
    kind: &'static str,
    id: u64,
  },

  /// Updates and deletes address items by id.
  #[error("cannot {action} a {kind} without an id")]
  MissingId { kind: &'static str, action: &'static str },

  /// The remote refused the request.
  #[error("request rejected: {0}")]
  Rejected(String),

  /// The call exceeded the configured timeout.
  #[error("call timed out after {0:?}")]
  Timeout(Duration),

  /// The worker never reported back (panicked or was cancelled).
  #[error("worker task did not complete")]
  Aborted,
}

/// Remote operations for one item domain.
///
/// Implementations must be safe to call concurrently; the executor issues
/// up to `parallelism` calls at once.
#[async_trait]
pub trait ItemClient<T: Item>: Send + Sync {
  /// Create `item` and return it as stored, carrying its remote-assigned id.
  async fn create(&self, repository: &RepositoryRef, item: &T) -> Result<T, ClientError>;

  /// Replace the item with `item`'s id and return it as stored.
  async fn update(&self, repository: &RepositoryRef, item: &T) -> Result<T, ClientError>;

  /// Remove the item with `item`'s id.
  async fn delete(&self, repository: &RepositoryRef, item: &T) -> Result<(), ClientError>;
}
