//! Assertions that a build is recent enough to release.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::ci::CiBackend;
use crate::graph::{DependencyBuilder, GraphError, GraphOptions};
use crate::project::{BuildNumber, ProjectKind, ProjectRef, ResolutionError};

#[derive(Debug, Error)]
pub enum AgeError {
  #[error("project '{project}' has no stable build")]
  NeverBuilt { project: String },

  #[error(
    "actual age: {age} seconds of {project} build {build} is older than maximum age: {max_age} seconds"
  )]
  TooOld {
    project: String,
    build: BuildNumber,
    age: i64,
    max_age: u64,
  },

  #[error("'{dependency}' is not a dependency of {master}")]
  DependencyNotFound { dependency: String, master: String },

  #[error(transparent)]
  Resolution(#[from] ResolutionError),

  #[error(transparent)]
  Graph(#[from] GraphError),
}

/// Check the resolved build of `project` against `max_age` at `now`, returning its age in seconds.
pub fn check_age(project: &ProjectRef, max_age: Duration, now: DateTime<Utc>) -> Result<i64, AgeError> {
  let age = project.seconds_since_build(now).ok_or_else(|| AgeError::NeverBuilt {
    project: project.name().to_string(),
  })?;
  let max_age = max_age.as_secs();

  if age > max_age as i64 {
    return Err(AgeError::TooOld {
      project: project.name().to_string(),
      build: BuildNumber(project.build_number()),
      age,
      max_age,
    });
  }
  info!(
    project = project.name(),
    age, max_age, "actual age is younger than maximum age"
  );
  Ok(age)
}

/// Fail if the latest stable build of `job` is older than `max_age`.
pub fn assert_job_age(backend: &dyn CiBackend, job: &str, max_age: Duration) -> Result<i64, AgeError> {
  let project = ProjectRef::resolve(backend, ProjectKind::Ci, job, None, "")?;
  check_age(&project, max_age, Utc::now())
}

/// Fail if `dependency`, as used by `master` at `build`, was built longer than `max_age` ago.
pub fn assert_dependency_age(
  backend: &dyn CiBackend,
  master: &str,
  build: u64,
  dependency: &str,
  max_age: Duration,
  options: &GraphOptions,
) -> Result<i64, AgeError> {
  let root = ProjectRef::resolve(backend, ProjectKind::Ci, master, Some(build), &options.repository_project)?;
  let builder = DependencyBuilder::new(backend, root, GraphOptions {
    recursive: true,
    ..options.clone()
  })?;

  let project = builder
    .set()
    .get(dependency)
    .ok_or_else(|| AgeError::DependencyNotFound {
      dependency: dependency.to_string(),
      master: format!("{}-{}", master, build),
    })?;
  debug!(dependency = %project, "found dependency");
  check_age(project, max_age, Utc::now())
}
