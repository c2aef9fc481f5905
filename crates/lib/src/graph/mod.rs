//! Dependency graph building.
//!
//! A [`DependencyBuilder`] starts from a master project and collects every project
//! it depends on into a [`DependencySet`]:
//!
//! 1. Each direct upstream of the master is resolved at its latest stable build.
//! 2. The manifest archived by each upstream is parsed and its master and entries
//!    are merged in order.
//!
//! Upstream manifests are already closed over their own dependencies, so one level
//! of traversal reaches everything. A project reached twice must resolve to the
//! same build number on both paths; otherwise the build is inconsistent and a
//! [`DependencyConflictError`] is returned.

use std::fmt;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::{Span, debug, info, info_span, warn};

use crate::ci::CiBackend;
use crate::manifest::{
  ManifestDocument, ManifestEntry, ManifestError, ManifestProject, ParseError, parse, render,
};
use crate::project::{BuildNumber, ProjectKind, ProjectRef, ResolutionError, SoftWarning};

/// The same project was reached with two different build numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyConflictError {
  pub name: String,
  pub present: Option<u64>,
  pub new: Option<u64>,
}

impl fmt::Display for DependencyConflictError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "project {} already present, with different build-number (new build-number {}, present build-number {})",
      self.name,
      BuildNumber(self.new),
      BuildNumber(self.present)
    )
  }
}

impl std::error::Error for DependencyConflictError {}

/// Errors building a dependency set.
#[derive(Debug, Error)]
pub enum GraphError {
  #[error(transparent)]
  Conflict(#[from] DependencyConflictError),

  #[error(transparent)]
  Resolution(#[from] ResolutionError),

  #[error("invalid manifest archived by {project}: {source}")]
  Parse {
    project: String,
    #[source]
    source: ParseError,
  },

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

/// One dependency and who introduced it.
#[derive(Debug, Clone)]
pub struct DependencyEntry {
  pub project: ProjectRef,
  /// `None` when introduced by the master project.
  pub added_by: Option<String>,
  /// Soft conditions met while merging this entry.
  pub warnings: Vec<SoftWarning>,
}

/// The master project and its ordered, name-unique dependencies.
#[derive(Debug, Clone)]
pub struct DependencySet {
  master: ProjectRef,
  entries: Vec<DependencyEntry>,
}

impl DependencySet {
  pub fn new(master: ProjectRef) -> Self {
    Self {
      master,
      entries: Vec::new(),
    }
  }

  pub fn master(&self) -> &ProjectRef {
    &self.master
  }

  pub fn entries(&self) -> &[DependencyEntry] {
    &self.entries
  }

  /// Append `project` unless a project of the same name is present.
  ///
  /// Returns `true` if the project was appended. A present project with the same
  /// build number is left alone; a different build number is a conflict.
  pub fn add_dependency(
    &mut self,
    project: ProjectRef,
    added_by: Option<String>,
  ) -> Result<bool, DependencyConflictError> {
    if let Some(present) = self.get(project.name()) {
      if present.build_number() == project.build_number() {
        debug!(project = project.name(), "already present with same build number");
        return Ok(false);
      }
      return Err(DependencyConflictError {
        name: project.name().to_string(),
        present: present.build_number(),
        new: project.build_number(),
      });
    }

    debug!(project = %project, added_by = ?added_by, "adding dependency");
    self.entries.push(DependencyEntry {
      project,
      added_by,
      warnings: Vec::new(),
    });
    Ok(true)
  }

  /// Find a dependency by name. The master is not an entry.
  pub fn get(&self, name: &str) -> Option<&ProjectRef> {
    self.entries.iter().map(|e| &e.project).find(|p| p.name() == name)
  }

  /// Convert to a manifest document. Entries added by the master name it explicitly.
  pub fn to_document(&self, created: Option<NaiveDateTime>) -> ManifestDocument {
    ManifestDocument {
      created,
      master: ManifestProject::from(&self.master),
      entries: self
        .entries
        .iter()
        .map(|entry| ManifestEntry {
          project: ManifestProject::from(&entry.project),
          added_by: entry
            .added_by
            .clone()
            .unwrap_or_else(|| self.master.name().to_string()),
        })
        .collect(),
    }
  }

  /// Manifest text stamped with the current local time.
  pub fn render(&self) -> String {
    render(&self.to_document(Some(Local::now().naive_local())))
  }

  /// Write the manifest to `path`.
  pub fn persist(&self, path: &Path) -> Result<(), ManifestError> {
    self.to_document(Some(Local::now().naive_local())).save(path)
  }

  /// Every soft warning of the master and the entries.
  pub fn warnings(&self) -> impl Iterator<Item = &SoftWarning> {
    self.master.warnings().iter().chain(
      self
        .entries
        .iter()
        .flat_map(|e| e.project.warnings().iter().chain(e.warnings.iter())),
    )
  }
}

/// How a builder resolves and merges upstream manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphOptions {
  /// Artifact name of the manifest archived by each build.
  pub manifest_filename: String,
  /// Job that archives third-party artifacts.
  pub repository_project: String,
  /// Walk the master's upstreams on construction.
  pub recursive: bool,
}

/// Builds a [`DependencySet`] against a CI backend.
pub struct DependencyBuilder<'a> {
  backend: &'a dyn CiBackend,
  options: GraphOptions,
  set: DependencySet,
  span: Span,
}

impl<'a> DependencyBuilder<'a> {
  /// Create a builder for `master`, walking its upstreams if `options.recursive` is set.
  pub fn new(backend: &'a dyn CiBackend, master: ProjectRef, options: GraphOptions) -> Result<Self, GraphError> {
    let span = info_span!("dependency_set", master = %master);
    let mut builder = Self {
      backend,
      options,
      set: DependencySet::new(master),
      span,
    };

    if builder.options.recursive {
      builder.add_upstream_dependencies()?;
    }
    Ok(builder)
  }

  pub fn set(&self) -> &DependencySet {
    &self.set
  }

  pub fn into_set(self) -> DependencySet {
    self.set
  }

  pub fn add_dependency(&mut self, project: ProjectRef, added_by: Option<String>) -> Result<bool, GraphError> {
    let _enter = self.span.enter();
    Ok(self.set.add_dependency(project, added_by)?)
  }

  /// Add `project` and merge the manifest it archived, if any.
  pub fn add_with_manifest(&mut self, project: ProjectRef, added_by: Option<String>) -> Result<(), GraphError> {
    let span = self.span.clone();
    let _enter = span.enter();

    if project.kind() == ProjectKind::Repository {
      self.set.add_dependency(project, added_by)?;
      return Ok(());
    }

    let content = project.dependency_manifest_content(self.backend, &self.options.manifest_filename)?;
    let name = project.name().to_string();
    let build = project.build_number();
    self.set.add_dependency(project, added_by)?;
    self.merge_manifest_content(&name, build, content)
  }

  /// Merge every project listed in manifest `text`, read from the build of `source`.
  ///
  /// The manifest's master is merged as a direct dependency; its entries keep their added-by names.
  pub fn merge_manifest(&mut self, source: &str, text: &str) -> Result<(), GraphError> {
    let span = self.span.clone();
    let _enter = span.enter();

    let document = parse(text, &self.options.repository_project).map_err(|e| GraphError::Parse {
      project: source.to_string(),
      source: e,
    })?;

    let master = document.master.resolve(self.backend, &self.options.repository_project)?;
    self.set.add_dependency(master, None)?;

    for entry in &document.entries {
      let project = entry.project.resolve(self.backend, &self.options.repository_project)?;
      self.set.add_dependency(project, Some(entry.added_by.clone()))?;
    }
    Ok(())
  }

  fn add_upstream_dependencies(&mut self) -> Result<(), GraphError> {
    let span = self.span.clone();
    let _enter = span.enter();

    let upstream_names = self.set.master.upstream_names().to_vec();
    info!(upstreams = ?upstream_names, "resolving upstream projects");

    let mut upstreams = Vec::with_capacity(upstream_names.len());
    for name in &upstream_names {
      let project = ProjectRef::resolve(
        self.backend,
        ProjectKind::Ci,
        name,
        None,
        &self.options.repository_project,
      )?;
      upstreams.push(project.clone());
      self.set.add_dependency(project, None)?;
    }

    for upstream in &upstreams {
      let content = upstream.dependency_manifest_content(self.backend, &self.options.manifest_filename)?;
      self.merge_manifest_content(upstream.name(), upstream.build_number(), content)?;
    }
    Ok(())
  }

  fn merge_manifest_content(&mut self, name: &str, build: Option<u64>, content: Option<String>) -> Result<(), GraphError> {
    match content {
      Some(text) => self.merge_manifest(name, &text),
      None => {
        let warning = SoftWarning::MissingManifest {
          project: name.to_string(),
          build,
          filename: self.options.manifest_filename.clone(),
        };
        warn!("{}", warning);
        if let Some(entry) = self.set.entries.iter_mut().find(|e| e.project.name() == name) {
          entry.warnings.push(warning);
        }
        Ok(())
      }
    }
  }
}
