//! Manifest documents and their link to live project references.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

use super::{ParseError, parse, render};
use crate::ci::CiBackend;
use crate::project::{ProjectKind, ProjectRef, ResolutionError, ScmLocation};

/// Errors reading or writing a manifest file.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest '{}': {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write manifest '{}': {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid manifest '{}': {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: ParseError,
  },
}

/// A project as recorded in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestProject {
  pub name: String,
  /// `None` is written as `unknown`.
  pub build_number: Option<u64>,
  pub scm: Vec<ScmLocation>,
  pub kind: ProjectKind,
}

impl ManifestProject {
  /// Resolve this description into a live reference at the recorded build.
  pub fn resolve(&self, backend: &dyn CiBackend, repository_project: &str) -> Result<ProjectRef, ResolutionError> {
    debug!(project = %self.name, build = ?self.build_number, kind = ?self.kind, "resolving manifest project");
    ProjectRef::resolve(backend, self.kind, &self.name, self.build_number, repository_project)
  }
}

impl From<&ProjectRef> for ManifestProject {
  fn from(project: &ProjectRef) -> Self {
    Self {
      name: project.name().to_string(),
      build_number: project.build_number(),
      scm: project.scm_info().map(<[ScmLocation]>::to_vec).unwrap_or_default(),
      kind: project.kind(),
    }
  }
}

/// One dependency record of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
  pub project: ManifestProject,
  /// Name of the project that introduced this dependency.
  pub added_by: String,
}

/// A parsed or to-be-rendered manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDocument {
  /// Omitted from the header when `None`.
  pub created: Option<NaiveDateTime>,
  pub master: ManifestProject,
  pub entries: Vec<ManifestEntry>,
}

impl ManifestDocument {
  /// Read and parse the manifest at `path`.
  pub fn load(path: &Path, repository_project: &str) -> Result<Self, ManifestError> {
    let text = fs::read_to_string(path).map_err(|e| ManifestError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    parse(&text, repository_project).map_err(|e| ManifestError::Parse {
      path: path.to_path_buf(),
      source: e,
    })
  }

  /// Render and write the manifest to `path`, replacing any existing file.
  pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
    fs::write(path, render(self)).map_err(|e| ManifestError::Write {
      path: path.to_path_buf(),
      source: e,
    })
  }

  /// The master or the entry named `name`.
  pub fn find(&self, name: &str) -> Option<&ManifestProject> {
    if self.master.name == name {
      return Some(&self.master);
    }
    self.entries.iter().map(|e| &e.project).find(|p| p.name == name)
  }
}
