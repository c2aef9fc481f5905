//! Third-party artifacts archived by the shared repository job.
//!
//! The repository job archives one directory per artifact; the directory name is
//! the artifact name. Each directory holds the artifact file and optionally an
//! `.md5` checksum next to it.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::{ResolutionError, ScmLocation};
use crate::ci::{ArtifactInfo, CiBackend};
use crate::consts::{JOB_INFO_DEPTH, MD5_SUFFIX, REPOSITORY_REVISION};

/// A repository artifact resolved at one build of the repository job.
#[derive(Debug, Clone)]
pub struct RepositoryArtifact {
  name: String,
  repository: String,
  build_number: Option<u64>,
  build_timestamp: Option<i64>,
  scm: Vec<ScmLocation>,
  artifacts: BTreeMap<String, String>,
}

impl RepositoryArtifact {
  /// Look up `artifact` in build `build_number` (or the last successful build) of `repository`.
  pub fn resolve(
    backend: &dyn CiBackend,
    artifact: &str,
    repository: &str,
    build_number: Option<u64>,
  ) -> Result<Self, ResolutionError> {
    debug!(artifact, repository, "getting repository info");
    let info = backend
      .job_info(repository, JOB_INFO_DEPTH)
      .map_err(|e| ResolutionError::backend(repository, e))?;

    let number = build_number
      .or(info.last_successful_build.as_ref().map(|b| b.number))
      .ok_or_else(|| ResolutionError::RepositoryNeverBuilt {
        repository: repository.to_string(),
      })?;

    let build = info.build(number).ok_or_else(|| ResolutionError::InvalidBuild {
      project: repository.to_string(),
      build: number,
      valid: info.build_numbers(),
    })?;

    let mut groups = group_by_directory(&build.artifacts);
    let Some(files) = groups.remove(artifact) else {
      return Err(ResolutionError::ArtifactNotFound {
        artifact: artifact.to_string(),
        repository: repository.to_string(),
        available: groups.into_keys().collect(),
      });
    };

    let mut artifacts = BTreeMap::new();
    for file in select_files(files) {
      let url = backend
        .job_url(repository, &format!("{}/artifact/{}", number, file.relative_path))
        .map_err(|e| ResolutionError::backend(repository, e))?;
      artifacts.insert(file.file_name.clone(), url);
    }

    Ok(Self {
      name: artifact.to_string(),
      repository: repository.to_string(),
      build_number: Some(number),
      build_timestamp: Some(build.timestamp),
      scm: vec![ScmLocation::new(repository, REPOSITORY_REVISION)],
      artifacts,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Name of the repository job this artifact lives in.
  pub fn repository(&self) -> &str {
    &self.repository
  }

  pub fn build_number(&self) -> Option<u64> {
    self.build_number
  }

  pub fn build_timestamp(&self) -> Option<i64> {
    self.build_timestamp
  }

  /// The single pseudo-location `(repository, "NA")`.
  pub fn scm_info(&self) -> &[ScmLocation] {
    &self.scm
  }

  pub fn artifact_map(&self) -> &BTreeMap<String, String> {
    &self.artifacts
  }
}

fn group_by_directory(artifacts: &[ArtifactInfo]) -> BTreeMap<String, Vec<&ArtifactInfo>> {
  let mut groups: BTreeMap<String, Vec<&ArtifactInfo>> = BTreeMap::new();
  for artifact in artifacts {
    let directory = Path::new(&artifact.relative_path)
      .parent()
      .and_then(Path::file_name)
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    groups.entry(directory).or_default().push(artifact);
  }
  groups
}

/// The main file and the checksum file of a group; later files of the same kind replace earlier ones.
fn select_files(files: Vec<&ArtifactInfo>) -> Vec<&ArtifactInfo> {
  let mut main = None;
  let mut checksum = None;
  for file in files {
    if file.file_name.ends_with(MD5_SUFFIX) {
      checksum = Some(file);
    } else {
      main = Some(file);
    }
  }
  main.into_iter().chain(checksum).collect()
}
