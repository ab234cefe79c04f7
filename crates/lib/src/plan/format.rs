//! Document encodings and file handling shared by every on-disk document.
//!
//! Two encodings are supported, JSON and YAML. Readers accept either; the
//! writer picks one from an explicit [`DocumentFormat`] or from the file
//! extension.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors reading or writing a document file.
#[derive(Debug, Error)]
pub enum DocumentError {
  /// Path contains a `..` component.
  #[error("refusing path with parent directory component: {}", .0.display())]
  UnsafePath(PathBuf),

  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to encode document as JSON: {0}")]
  EncodeJson(#[source] serde_json::Error),

  #[error("failed to encode document as YAML: {0}")]
  EncodeYaml(#[source] serde_yaml::Error),

  /// Neither encoding accepted the content.
  #[error("document is neither valid JSON ({json}) nor valid YAML ({yaml})")]
  Decode { json: serde_json::Error, yaml: serde_yaml::Error },

  #[error("unknown document format '{0}' (expected json or yaml)")]
  UnknownFormat(String),
}

/// On-disk encoding of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
  Json,
  #[default]
  Yaml,
}

impl DocumentFormat {
  /// `.json` files are JSON, everything else is YAML.
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
      _ => DocumentFormat::Yaml,
    }
  }
}

impl FromStr for DocumentFormat {
  type Err = DocumentError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "json" => Ok(DocumentFormat::Json),
      "yaml" | "yml" => Ok(DocumentFormat::Yaml),
      other => Err(DocumentError::UnknownFormat(other.to_string())),
    }
  }
}

/// Reject paths that climb out of their directory.
pub fn validate_path(path: &Path) -> Result<(), DocumentError> {
  if path.components().any(|c| matches!(c, Component::ParentDir)) {
    return Err(DocumentError::UnsafePath(path.to_path_buf()));
  }
  Ok(())
}

/// Validate `path`, then read it to a string.
pub fn read_text(path: &Path) -> Result<String, DocumentError> {
  validate_path(path)?;
  fs::read_to_string(path).map_err(|source| DocumentError::Read {
    path: path.to_path_buf(),
    source,
  })
}

/// Decode `content`, trying JSON first and YAML second.
pub fn decode<V: DeserializeOwned>(content: &str) -> Result<V, DocumentError> {
  match serde_json::from_str(content) {
    Ok(value) => Ok(value),
    Err(json) => serde_yaml::from_str(content).map_err(|yaml| DocumentError::Decode { json, yaml }),
  }
}

/// Encode `value`. JSON output is pretty-printed and newline-terminated.
pub fn encode<V: Serialize + ?Sized>(value: &V, format: DocumentFormat) -> Result<String, DocumentError> {
  match format {
    DocumentFormat::Json => {
      let mut content = serde_json::to_string_pretty(value).map_err(DocumentError::EncodeJson)?;
      content.push('\n');
      Ok(content)
    }
    DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(DocumentError::EncodeYaml),
  }
}

/// Write `content` to `path` atomically (temp file, then rename).
pub fn write_atomic(path: &Path, content: &str) -> Result<(), DocumentError> {
  validate_path(path)?;

  let write_err = |source| DocumentError::Write {
    path: path.to_path_buf(),
    source,
  };

  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).map_err(write_err)?;
  }

  let mut temp_name = path.as_os_str().to_owned();
  temp_name.push(".tmp");
  let temp_path = PathBuf::from(temp_name);

  fs::write(&temp_path, content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)?;

  Ok(())
}
