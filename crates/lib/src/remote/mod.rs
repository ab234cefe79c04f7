//! Offline remote backed by a state document.
//!
//! [`FileRemote`] stands in for a live server: it keeps a state document in
//! memory, serves [`ItemClient`] calls against it, and writes it back with
//! [`FileRemote::persist`]. New items get the next id of their domain; ids
//! freed by deletes are never issued again.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::execute::{ClientError, ItemClient};
use crate::repository::RepositoryRef;
use crate::state::{StateDocument, StateError, StateItem};

#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("failed to open remote: {0}")]
  Open(#[source] StateError),

  #[error("failed to persist remote: {0}")]
  Persist(#[source] StateError),
}

/// A remote whose storage is a local state document.
#[derive(Debug)]
pub struct FileRemote {
  path: PathBuf,
  document: Mutex<StateDocument>,
}

impl FileRemote {
  /// Open the document at `path`. A missing file starts an empty remote.
  pub fn open(path: impl Into<PathBuf>) -> Result<Self, RemoteError> {
    let path = path.into();
    let document = if path.exists() {
      StateDocument::load(&path).map_err(RemoteError::Open)?
    } else {
      info!(path = %path.display(), "remote document does not exist, starting empty");
      StateDocument::default()
    };

    Ok(Self::new(path, document))
  }

  pub fn new(path: impl Into<PathBuf>, mut document: StateDocument) -> Self {
    document.reserve_present_ids();
    Self {
      path: path.into(),
      document: Mutex::new(document),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Copy of the current document.
  pub async fn snapshot(&self) -> StateDocument {
    self.document.lock().await.clone()
  }

  /// Write the document back to its path atomically.
  pub async fn persist(&self) -> Result<(), RemoteError> {
    let document = self.document.lock().await;
    document.save(&self.path).map_err(RemoteError::Persist)?;
    debug!(path = %self.path.display(), "remote persisted");
    Ok(())
  }
}

fn required_id<T: StateItem>(item: &T, action: &'static str) -> Result<u64, ClientError> {
  item.id().ok_or(ClientError::MissingId { kind: T::KIND, action })
}

#[async_trait]
impl<T: StateItem> ItemClient<T> for FileRemote {
  async fn create(&self, repository: &RepositoryRef, item: &T) -> Result<T, ClientError> {
    let mut document = self.document.lock().await;

    let mut created = item.clone();
    created.set_id(Some(document.issue_id::<T>()));
    T::collection_mut(document.ensure_repository(repository)).push(created.clone());

    Ok(created)
  }

  async fn update(&self, repository: &RepositoryRef, item: &T) -> Result<T, ClientError> {
    let id = required_id(item, "update")?;
    let mut document = self.document.lock().await;

    let config = document
      .repository_mut(repository)
      .ok_or_else(|| ClientError::RepositoryNotFound(repository.clone()))?;
    let stored = T::collection_mut(config)
      .iter_mut()
      .find(|stored| stored.id() == Some(id))
      .ok_or_else(|| ClientError::ItemNotFound {
        repository: repository.clone(),
        kind: T::KIND,
        id,
      })?;
    *stored = item.clone();

    Ok(item.clone())
  }

  async fn delete(&self, repository: &RepositoryRef, item: &T) -> Result<(), ClientError> {
    let id = required_id(item, "delete")?;
    let mut document = self.document.lock().await;

    let config = document
      .repository_mut(repository)
      .ok_or_else(|| ClientError::RepositoryNotFound(repository.clone()))?;
    let items = T::collection_mut(config);
    let Some(pos) = items.iter().position(|stored| stored.id() == Some(id)) else {
      return Err(ClientError::ItemNotFound {
        repository: repository.clone(),
        kind: T::KIND,
        id,
      });
    };
    items.remove(pos);

    Ok(())
  }
}
