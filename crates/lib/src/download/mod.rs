//! Downloading the artifacts a manifest refers to.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::ci::{CiBackend, CiError};
use crate::manifest::ManifestDocument;
use crate::project::ResolutionError;

/// Pattern that selects every artifact.
pub const ALL_ARTIFACTS: &str = ".*";

#[derive(Debug, Error)]
pub enum DownloadError {
  #[error("invalid artifact pattern '{pattern}': {source}")]
  Pattern {
    pattern: String,
    #[source]
    source: regex::Error,
  },

  #[error(transparent)]
  Resolution(#[from] ResolutionError),

  #[error("failed to create '{}': {source}", .path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to download '{name}': {source}")]
  Fetch {
    name: String,
    #[source]
    source: CiError,
  },
}

/// Compile `pattern` so it must match from the first character of a name.
pub fn anchored_pattern(pattern: &str) -> Result<Regex, DownloadError> {
  Regex::new(&format!("^(?:{})", pattern)).map_err(|e| DownloadError::Pattern {
    pattern: pattern.to_string(),
    source: e,
  })
}

/// Download every artifact of the manifest's master and entries whose name matches `pattern`.
///
/// The manifest file itself is never downloaded. `target` is created only when at least
/// one artifact matches. Returns the written paths in download order.
pub fn download_artifacts(
  backend: &dyn CiBackend,
  document: &ManifestDocument,
  target: &Path,
  pattern: &str,
  manifest_filename: &str,
  repository_project: &str,
) -> Result<Vec<PathBuf>, DownloadError> {
  info!(target = %target.display(), pattern, "downloading artifacts");
  let matcher = anchored_pattern(pattern)?;

  let mut selected = Vec::new();
  for description in std::iter::once(&document.master).chain(document.entries.iter().map(|e| &e.project)) {
    let project = description.resolve(backend, repository_project)?;
    for (name, url) in project.artifact_map() {
      if name != manifest_filename && matcher.is_match(name) {
        selected.push((name.clone(), url.clone()));
      }
    }
  }

  if selected.is_empty() {
    info!("no artifacts matched");
    return Ok(Vec::new());
  }

  fs::create_dir_all(target).map_err(|e| DownloadError::CreateDir {
    path: target.to_path_buf(),
    source: e,
  })?;

  let mut written = Vec::with_capacity(selected.len());
  for (name, url) in selected {
    let dest = target.join(&name);
    debug!(name, url, "downloading artifact");
    backend
      .download(&url, &dest)
      .map_err(|e| DownloadError::Fetch { name, source: e })?;
    written.push(dest);
  }
  Ok(written)
}
