//! Project references.
//!
//! A [`ProjectRef`] describes one buildable unit at one build number: its name,
//! the build that was resolved, where its sources live and what it archived. There
//! are two kinds:
//!
//! - [`CiProject`] - a project built by its own CI job
//! - [`RepositoryArtifact`] - a third-party artifact archived by a shared repository job
//!
//! References are resolved against the CI server once, at construction, and are
//! immutable afterwards. Two references are equal when their names are equal; the
//! build number is deliberately not part of equality.

mod ci;
mod repository;
pub mod scm;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::ci::{CiBackend, CiError};

pub use ci::CiProject;
pub use repository::RepositoryArtifact;

/// A revision-control location and the revision that was built from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScmLocation {
  pub location: String,
  pub revision: String,
}

impl ScmLocation {
  pub fn new(location: impl Into<String>, revision: impl Into<String>) -> Self {
    Self {
      location: location.into(),
      revision: revision.into(),
    }
  }
}

/// Which kind of project a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectKind {
  Ci,
  Repository,
}

/// A condition that degrades a result without stopping resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftWarning {
  /// The project has no stable build yet.
  NeverBuilt { project: String },
  /// The configuration root element is not one we know how to read.
  UnknownConfigType { project: String, root: String },
  /// The configuration has no revision-control location.
  NoScmLocation { project: String },
  /// A location was configured but the build recorded no revision for it.
  MissingRevision {
    project: String,
    location: String,
    build: Option<u64>,
  },
  /// The build archived no manifest, so its dependencies could not be merged.
  MissingManifest {
    project: String,
    build: Option<u64>,
    filename: String,
  },
}

impl fmt::Display for SoftWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NeverBuilt { project } => write!(f, "project '{}' has never been built", project),
      Self::UnknownConfigType { project, root } => {
        write!(f, "unknown configuration type '{}' for project '{}'", root, project)
      }
      Self::NoScmLocation { project } => write!(f, "no revision-control location for project '{}'", project),
      Self::MissingRevision {
        project,
        location,
        build,
      } => write!(
        f,
        "no revision for '{}' in build {} of project '{}'",
        location,
        BuildNumber(*build),
        project
      ),
      Self::MissingManifest {
        project,
        build,
        filename,
      } => write!(
        f,
        "no {} among artifacts of {}-{}",
        filename,
        project,
        BuildNumber(*build)
      ),
    }
  }
}

/// Display helper: a build number or `unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildNumber(pub Option<u64>);

impl fmt::Display for BuildNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Some(n) => write!(f, "{}", n),
      None => f.write_str("unknown"),
    }
  }
}

/// Errors resolving a project reference.
#[derive(Debug, Error)]
pub enum ResolutionError {
  #[error("project '{project}' does not exist on the CI server")]
  ProjectNotFound { project: String },

  #[error(
    "build number {build} is not a valid build number for project {project}. Valid build numbers are {valid:?}"
  )]
  InvalidBuild { project: String, build: u64, valid: Vec<u64> },

  #[error("could not find repository artifact '{artifact}' in repository '{repository}', available artifacts {available:?}")]
  ArtifactNotFound {
    artifact: String,
    repository: String,
    available: Vec<String>,
  },

  #[error("repository '{repository}' has no successful build")]
  RepositoryNeverBuilt { repository: String },

  #[error("failed to query project '{project}': {source}")]
  Backend {
    project: String,
    #[source]
    source: CiError,
  },
}

impl ResolutionError {
  pub(crate) fn backend(project: &str, source: CiError) -> Self {
    match source {
      CiError::Status { status: 404, .. } => Self::ProjectNotFound {
        project: project.to_string(),
      },
      source => Self::Backend {
        project: project.to_string(),
        source,
      },
    }
  }
}

/// Errors cancelling a build.
#[derive(Debug, Error)]
pub enum AbortError {
  #[error("abort of {project}-{build} was rejected: {source}")]
  Rejected {
    project: String,
    build: u64,
    #[source]
    source: CiError,
  },

  #[error("project '{project}' has no resolved build to abort")]
  NoBuild { project: String },

  #[error("repository artifact '{artifact}' is not a CI build and cannot be aborted")]
  NotAbortable { artifact: String },
}

/// A resolved project of either kind.
#[derive(Debug, Clone)]
pub enum ProjectRef {
  Ci(CiProject),
  Repository(RepositoryArtifact),
}

impl ProjectRef {
  /// Resolve a project of the given kind against the CI server.
  ///
  /// `build_number` of `None` selects the latest stable (CI) or successful (repository) build.
  pub fn resolve(
    backend: &dyn CiBackend,
    kind: ProjectKind,
    name: &str,
    build_number: Option<u64>,
    repository_project: &str,
  ) -> Result<Self, ResolutionError> {
    match kind {
      ProjectKind::Ci => CiProject::resolve(backend, name, build_number).map(Self::Ci),
      ProjectKind::Repository => {
        RepositoryArtifact::resolve(backend, name, repository_project, build_number).map(Self::Repository)
      }
    }
  }

  pub fn name(&self) -> &str {
    match self {
      Self::Ci(p) => p.name(),
      Self::Repository(p) => p.name(),
    }
  }

  pub fn kind(&self) -> ProjectKind {
    match self {
      Self::Ci(_) => ProjectKind::Ci,
      Self::Repository(_) => ProjectKind::Repository,
    }
  }

  /// The resolved build number, `None` if the project was never built.
  pub fn build_number(&self) -> Option<u64> {
    match self {
      Self::Ci(p) => p.build_number(),
      Self::Repository(p) => p.build_number(),
    }
  }

  /// Revision-control locations of the resolved build, `None` if none could be determined.
  pub fn scm_info(&self) -> Option<&[ScmLocation]> {
    match self {
      Self::Ci(p) => p.scm_info(),
      Self::Repository(p) => Some(p.scm_info()),
    }
  }

  /// Upstream projects that trigger this one. Always empty for repository artifacts.
  pub fn upstream_names(&self) -> &[String] {
    match self {
      Self::Ci(p) => p.upstream_names(),
      Self::Repository(_) => &[],
    }
  }

  /// Artifact filename to download URL.
  pub fn artifact_map(&self) -> &BTreeMap<String, String> {
    match self {
      Self::Ci(p) => p.artifact_map(),
      Self::Repository(p) => p.artifact_map(),
    }
  }

  /// Text of the manifest archived by this build, if any.
  pub fn dependency_manifest_content(
    &self,
    backend: &dyn CiBackend,
    filename: &str,
  ) -> Result<Option<String>, ResolutionError> {
    match self {
      Self::Ci(p) => p.dependency_manifest_content(backend, filename),
      Self::Repository(_) => Ok(None),
    }
  }

  /// Cancel this build on the CI server.
  pub fn abort(&self, backend: &dyn CiBackend) -> Result<(), AbortError> {
    match self {
      Self::Ci(p) => p.abort(backend),
      Self::Repository(p) => Err(AbortError::NotAbortable {
        artifact: p.name().to_string(),
      }),
    }
  }

  /// Start of the resolved build, epoch milliseconds.
  pub fn build_timestamp(&self) -> Option<i64> {
    match self {
      Self::Ci(p) => p.build_timestamp(),
      Self::Repository(p) => p.build_timestamp(),
    }
  }

  /// Whole seconds elapsed between the resolved build's start and `now`.
  pub fn seconds_since_build(&self, now: DateTime<Utc>) -> Option<i64> {
    let started = Utc.timestamp_millis_opt(self.build_timestamp()?).single()?;
    let elapsed = now.signed_duration_since(started);
    Some((elapsed.num_milliseconds() as f64 / 1000.0).round() as i64)
  }

  /// Soft conditions recorded while resolving.
  pub fn warnings(&self) -> &[SoftWarning] {
    match self {
      Self::Ci(p) => p.warnings(),
      Self::Repository(_) => &[],
    }
  }
}

impl PartialEq for ProjectRef {
  fn eq(&self, other: &Self) -> bool {
    self.name() == other.name()
  }
}

impl Eq for ProjectRef {}

impl fmt::Display for ProjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.name(), BuildNumber(self.build_number()))
  }
}

/// Drop repeated names, keeping the first occurrence.
pub(crate) fn dedup_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
  let mut seen = std::collections::HashSet::new();
  names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}
