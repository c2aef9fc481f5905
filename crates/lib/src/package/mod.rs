//! Building a distributable package from the jobs of a view.
//!
//! A package is assembled in steps, each usable on its own:
//!
//! 1. [`view_artifacts`] reads the artifact declarations of every job in a view
//! 2. [`download_artifacts`](crate::download::download_artifacts) fetches what the
//!    local manifest lists and the declarations select
//! 3. [`check_md5_sums`] verifies the downloads against their `.md5` sidecars
//! 4. [`create_symlinks`] gives each declared artifact its stable name
//! 5. [`remove_md5_files`] optionally drops the sidecars
//! 6. [`create_package`] archives the folder as `<name>.tgz` with `<name>.tgz.md5`
//!
//! [`package_view`] runs them all.

mod archive;
mod description;
mod folder;

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::ci::{CiBackend, CiError};
use crate::download::{DownloadError, download_artifacts};
use crate::manifest::{ManifestDocument, ManifestError};

pub use archive::{Package, create_package};
pub use description::{ArtifactDeclaration, combined_pattern, description_artifacts, view_artifacts};
pub use folder::{check_md5_sums, create_symlinks, remove_md5_files};

/// Errors while packaging.
#[derive(Debug, Error)]
pub enum PackageError {
  #[error(transparent)]
  Ci(#[from] CiError),

  #[error("invalid configuration XML for '{job}': {message}")]
  Xml { job: String, message: String },

  #[error("unknown configuration type '{root}' for job '{job}'")]
  UnknownConfigType { job: String, root: String },

  #[error("malformed artifact declaration '{declaration}' in job '{job}', expected '<symlink>=<pattern>'")]
  MalformedDeclaration { job: String, declaration: String },

  #[error("invalid pattern '{pattern}': {source}")]
  Pattern {
    pattern: String,
    #[source]
    source: regex::Error,
  },

  #[error("could not find md5 file for artifact {}", .file.display())]
  MissingChecksum { file: PathBuf },

  #[error("md5 sum for file {} didn't match: {actual} != {expected}", .file.display())]
  ChecksumMismatch {
    file: PathBuf,
    expected: String,
    actual: String,
  },

  #[error("found multiple matching files for pattern {pattern}, matches {matches:?}")]
  AmbiguousPattern { pattern: String, matches: Vec<String> },

  #[error("IO error at '{}': {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Download(#[from] DownloadError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

/// Everything [`package_view`] needs.
#[derive(Debug, Clone)]
pub struct PackageRequest {
  /// Owner of the view.
  pub view_user: String,
  pub view: String,
  /// Declaration keyword in job descriptions.
  pub keyword: String,
  pub package_name: String,
  /// Folder to download into; renamed to `package_name` when archived.
  pub download_folder: PathBuf,
  /// Additional pattern alternative, beyond the declared ones.
  pub extra_pattern: Option<String>,
  pub remove_md5s: bool,
  /// Local manifest listing the builds to package.
  pub manifest_path: PathBuf,
  pub repository_project: String,
}

/// Download, verify, link and archive the artifacts declared by a view.
pub fn package_view(backend: &dyn CiBackend, request: &PackageRequest) -> Result<Package, PackageError> {
  let declarations = view_artifacts(backend, &request.view_user, &request.view, &request.keyword)?;
  let pattern = combined_pattern(&declarations, request.extra_pattern.as_deref());
  info!(declarations = declarations.len(), pattern = %pattern, "packaging view");

  fs::create_dir_all(&request.download_folder).map_err(|e| PackageError::Io {
    path: request.download_folder.clone(),
    source: e,
  })?;

  let manifest_filename = request
    .manifest_path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let document = ManifestDocument::load(&request.manifest_path, &request.repository_project)?;
  download_artifacts(
    backend,
    &document,
    &request.download_folder,
    &pattern,
    &manifest_filename,
    &request.repository_project,
  )?;

  check_md5_sums(&request.download_folder)?;
  create_symlinks(&request.download_folder, &declarations)?;
  if request.remove_md5s {
    remove_md5_files(&request.download_folder)?;
  }

  create_package(&request.download_folder, &request.package_name, &request.manifest_path)
}
