//! Plan documents.
//!
//! A plan document holds exactly one value under a named root key:
//!
//! ```yaml
//! diff:
//!   create: [...]
//!   update: [...]
//!   delete: [...]
//! ```
//!
//! Diffs, rollback plans and apply results are normalized before writing,
//! so logically equal values always serialize to identical bytes.

pub mod format;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::diff::ChangeSet;
use crate::execute::AppliedItems;
use crate::item::Item;
use crate::repository::normalize_entries;
use crate::rollback::RollbackPlan;

pub use format::{DocumentError, DocumentFormat};

/// Root key of a diff document.
pub const DIFF_ROOT: &str = "diff";

/// Root key of a rollback plan document.
pub const ROLLBACK_ROOT: &str = "rollback";

/// Root key of an apply-result document.
pub const APPLIED_ROOT: &str = "applied";

/// Errors reading or writing plan documents.
#[derive(Debug, Error)]
pub enum PlanError {
  #[error(transparent)]
  Document(#[from] DocumentError),

  #[error("{} has no '{root}' root key", .path.display())]
  MissingRoot { path: PathBuf, root: String },

  #[error("'{root}' in {} is malformed: {source}", .path.display())]
  Shape {
    path: PathBuf,
    root: String,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Encode `value` under `root`.
pub fn render_document<V: Serialize>(root: &str, value: &V, format: DocumentFormat) -> Result<String, PlanError> {
  let document = BTreeMap::from([(root, value)]);
  Ok(format::encode(&document, format)?)
}

/// Write `value` under `root` to `path`.
///
/// The encoding is `format` if given, otherwise derived from the extension.
pub fn write_document<V: Serialize>(
  path: &Path,
  root: &str,
  value: &V,
  format: Option<DocumentFormat>,
) -> Result<(), PlanError> {
  let format = format.unwrap_or_else(|| DocumentFormat::from_path(path));
  let content = render_document(root, value, format)?;
  format::write_atomic(path, &content)?;
  debug!(path = %path.display(), root, ?format, "document written");
  Ok(())
}

/// Read the value stored under `root` in `path`.
///
/// Paths with `..` components are rejected before the filesystem is touched.
pub fn read_document<V: DeserializeOwned>(path: &Path, root: &str) -> Result<V, PlanError> {
  let content = format::read_text(path)?;
  let document: serde_yaml::Value = format::decode(&content)?;

  let Some(value) = document.get(root) else {
    return Err(PlanError::MissingRoot {
      path: path.to_path_buf(),
      root: root.to_string(),
    });
  };

  serde_yaml::from_value(value.clone()).map_err(|source| PlanError::Shape {
    path: path.to_path_buf(),
    root: root.to_string(),
    source,
  })
}

pub fn write_diff<T: Item>(path: &Path, diff: &ChangeSet<T>, format: Option<DocumentFormat>) -> Result<(), PlanError> {
  let mut diff = diff.clone();
  diff.normalize();
  write_document(path, DIFF_ROOT, &diff, format)?;
  info!(path = %path.display(), "diff written");
  Ok(())
}

pub fn read_diff<T: Item>(path: &Path) -> Result<ChangeSet<T>, PlanError> {
  read_document(path, DIFF_ROOT)
}

/// Encode a rollback plan in canonical order, e.g. for echoing to stdout.
pub fn render_rollback_plan<T: Item>(plan: &RollbackPlan<T>, format: DocumentFormat) -> Result<String, PlanError> {
  let mut plan = plan.clone();
  plan.normalize();
  render_document(ROLLBACK_ROOT, &plan, format)
}

pub fn write_rollback_plan<T: Item>(
  path: &Path,
  plan: &RollbackPlan<T>,
  format: Option<DocumentFormat>,
) -> Result<(), PlanError> {
  let mut plan = plan.clone();
  plan.normalize();
  write_document(path, ROLLBACK_ROOT, &plan, format)?;
  info!(path = %path.display(), "rollback plan written");
  Ok(())
}

pub fn read_rollback_plan<T: Item>(path: &Path) -> Result<RollbackPlan<T>, PlanError> {
  read_document(path, ROLLBACK_ROOT)
}

/// Write the created and updated items of an apply, for audit.
pub fn write_applied<T: Item>(
  path: &Path,
  applied: &AppliedItems<T>,
  format: Option<DocumentFormat>,
) -> Result<(), PlanError> {
  let mut applied = applied.clone();
  normalize_entries(&mut applied.created);
  normalize_entries(&mut applied.updated);
  write_document(path, APPLIED_ROOT, &applied, format)?;
  info!(path = %path.display(), "apply results written");
  Ok(())
}
