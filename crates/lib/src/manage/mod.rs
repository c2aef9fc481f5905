//! Manifest lifecycle: creating a manifest for a build and adding projects to an existing one.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::ci::CiBackend;
use crate::graph::{DependencyBuilder, DependencyConflictError, DependencySet, GraphError, GraphOptions};
use crate::manifest::{ManifestDocument, ManifestError};
use crate::project::{AbortError, ProjectKind, ProjectRef, ResolutionError};

/// Errors from the manifest flows.
#[derive(Debug, Error)]
pub enum ManageError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Resolution(#[from] ResolutionError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  /// A conflict was found and the build could not be stopped either.
  #[error("{conflict}; aborting the build failed: {source}")]
  AbortFailed {
    conflict: DependencyConflictError,
    #[source]
    source: AbortError,
  },
}

impl ManageError {
  /// The conflict behind this error, if any.
  pub fn conflict(&self) -> Option<&DependencyConflictError> {
    match self {
      Self::Graph(GraphError::Conflict(conflict)) | Self::AbortFailed { conflict, .. } => Some(conflict),
      _ => None,
    }
  }
}

/// Build the manifest for `job` at `build` and write it to `path`.
///
/// On a dependency conflict the build is aborted on the CI server and nothing is written.
pub fn build_manifest(
  backend: &dyn CiBackend,
  job: &str,
  build: u64,
  path: &Path,
  options: &GraphOptions,
) -> Result<DependencySet, ManageError> {
  info!(project = job, build, "building dependency file");
  let master = ProjectRef::resolve(backend, ProjectKind::Ci, job, Some(build), &options.repository_project)?;

  let builder = match DependencyBuilder::new(backend, master.clone(), GraphOptions {
    recursive: true,
    ..options.clone()
  }) {
    Ok(builder) => builder,
    Err(GraphError::Conflict(conflict)) => {
      warn!(project = job, build, "aborting build, dependency mismatch detected");
      if let Err(source) = master.abort(backend) {
        return Err(ManageError::AbortFailed { conflict, source });
      }
      return Err(GraphError::Conflict(conflict).into());
    }
    Err(e) => return Err(e.into()),
  };

  let set = builder.into_set();
  set.persist(path)?;
  info!(path = %path.display(), "dependency file created");
  Ok(set)
}

/// Add a CI project or repository artifact, at its latest build, to the manifest at `path`.
///
/// A CI project's own archived manifest is merged too. The file is rewritten only if
/// every project resolves and no conflict is found.
pub fn add_to_manifest(
  backend: &dyn CiBackend,
  path: &Path,
  name: &str,
  kind: ProjectKind,
  options: &GraphOptions,
) -> Result<DependencySet, ManageError> {
  info!(project = name, ?kind, path = %path.display(), "adding to dependency file");
  let document = ManifestDocument::load(path, &options.repository_project)?;

  let master = document.master.resolve(backend, &options.repository_project)?;
  let master_name = master.name().to_string();
  let mut builder = DependencyBuilder::new(backend, master, GraphOptions {
    recursive: false,
    ..options.clone()
  })?;

  for entry in &document.entries {
    let project = entry.project.resolve(backend, &options.repository_project)?;
    builder.add_dependency(project, Some(entry.added_by.clone()))?;
  }

  let project = ProjectRef::resolve(backend, kind, name, None, &options.repository_project)?;
  builder.add_with_manifest(project, Some(master_name))?;

  let set = builder.into_set();
  set.persist(path)?;
  Ok(set)
}
