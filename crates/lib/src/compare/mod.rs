//! Revision changes of a job between two manifests.

use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::manifest::ManifestDocument;
use crate::project::BuildNumber;

#[derive(Debug, Error)]
pub enum CompareError {
  #[error("job '{job}' is not listed in the {which} manifest")]
  JobNotFound { job: String, which: &'static str },

  #[error("revision '{revision}' of {path} is not a number")]
  InvalidRevision { path: String, revision: String },

  #[error("failed to run '{command}': {source}")]
  Spawn {
    command: String,
    #[source]
    source: io::Error,
  },

  #[error(
    "error encountered during svn command. cmd = '{command}'\nstdout = '{stdout}'\nstderr = '{stderr}'\nreturncode = '{}'",
    .code.map_or_else(|| "signal".to_string(), |c| c.to_string())
  )]
  Command {
    command: String,
    stdout: String,
    stderr: String,
    code: Option<i32>,
  },
}

/// One location used by the job in both manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionChange {
  pub path: String,
  pub old: String,
  pub new: String,
}

impl RevisionChange {
  pub fn is_changed(&self) -> bool {
    self.old != self.new
  }
}

/// The job's builds in the two manifests and the revisions of their shared locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
  pub job: String,
  pub old_build: BuildNumber,
  pub new_build: BuildNumber,
  /// In the order of the new manifest's locations.
  pub changes: Vec<RevisionChange>,
}

/// Pair the locations recorded for `job` in `old` and `new` by path.
///
/// The job may be the master or an entry of either document. Locations present in
/// only one of them are left out.
pub fn compare_versions(old: &ManifestDocument, new: &ManifestDocument, job: &str) -> Result<Comparison, CompareError> {
  info!(job, "comparing manifests");
  let old_project = old.find(job).ok_or_else(|| CompareError::JobNotFound {
    job: job.to_string(),
    which: "old",
  })?;
  let new_project = new.find(job).ok_or_else(|| CompareError::JobNotFound {
    job: job.to_string(),
    which: "new",
  })?;
  debug!(old = ?old_project.scm, new = ?new_project.scm, "scm info");

  let mut changes = Vec::new();
  for current in &new_project.scm {
    for previous in old_project.scm.iter().filter(|p| p.location == current.location) {
      changes.push(RevisionChange {
        path: current.location.clone(),
        old: previous.revision.clone(),
        new: current.revision.clone(),
      });
    }
  }

  Ok(Comparison {
    job: job.to_string(),
    old_build: BuildNumber(old_project.build_number),
    new_build: BuildNumber(new_project.build_number),
    changes,
  })
}

/// Arguments for `svn log` (or `svn diff`) over the revisions after `old` up to `new`.
pub fn svn_args(change: &RevisionChange, diff: bool) -> Result<Vec<String>, CompareError> {
  let old: u64 = change.old.trim().parse().map_err(|_| CompareError::InvalidRevision {
    path: change.path.clone(),
    revision: change.old.clone(),
  })?;
  Ok(vec![
    if diff { "diff" } else { "log" }.to_string(),
    format!("-r{}:{}", old + 1, change.new),
    change.path.clone(),
  ])
}

/// Subversion log, or diff, for a changed location.
pub fn svn_log(change: &RevisionChange, diff: bool) -> Result<String, CompareError> {
  debug!(path = %change.path, old = %change.old, new = %change.new, "svn history");
  run("svn", &svn_args(change, diff)?)
}

fn run(program: &str, args: &[String]) -> Result<String, CompareError> {
  let command = std::iter::once(program)
    .chain(args.iter().map(String::as_str))
    .collect::<Vec<_>>()
    .join(" ");
  debug!(command = %command, "executing");

  let output = Command::new(program).args(args).output().map_err(|e| CompareError::Spawn {
    command: command.clone(),
    source: e,
  })?;
  let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

  if !output.status.success() {
    let err = CompareError::Command {
      command,
      stdout,
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      code: output.status.code(),
    };
    error!("{}", err);
    return Err(err);
  }
  Ok(stdout)
}
