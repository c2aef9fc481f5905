//! Projects built by their own CI job.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::scm;
use super::{AbortError, ResolutionError, ScmLocation, SoftWarning, dedup_names};
use crate::ci::{BuildInfo, CiBackend, JobInfo};
use crate::consts::JOB_INFO_DEPTH;

/// A CI-built project resolved at one build.
#[derive(Debug, Clone)]
pub struct CiProject {
  name: String,
  build_number: Option<u64>,
  last_stable_build: Option<u64>,
  last_successful_build: Option<u64>,
  build_timestamp: Option<i64>,
  scm: Option<Vec<ScmLocation>>,
  upstreams: Vec<String>,
  artifacts: BTreeMap<String, String>,
  warnings: Vec<SoftWarning>,
}

impl CiProject {
  /// Fetch project information and configuration, selecting `build_number` or the latest stable build.
  pub fn resolve(backend: &dyn CiBackend, name: &str, build_number: Option<u64>) -> Result<Self, ResolutionError> {
    debug!(project = name, "getting project info");
    let info = backend
      .job_info(name, JOB_INFO_DEPTH)
      .map_err(|e| ResolutionError::backend(name, e))?;

    let mut warnings = Vec::new();
    let last_stable_build = info.last_stable_build.as_ref().map(|b| b.number);
    let last_successful_build = info.last_successful_build.as_ref().map(|b| b.number);

    let build_number = build_number.or(last_stable_build);
    if build_number.is_none() {
      warn!(project = name, "could not find last stable build");
      warnings.push(SoftWarning::NeverBuilt {
        project: name.to_string(),
      });
    }
    debug!(project = name, build = ?build_number, "resolved build");

    let build = match build_number {
      Some(number) => Some(find_build(&info, name, number)?),
      None => None,
    };

    let config = backend.job_config(name).map_err(|e| ResolutionError::backend(name, e))?;
    let extraction = scm::extract(name, &config, build).map_err(|e| ResolutionError::backend(name, e))?;
    warnings.extend(extraction.warnings);

    let upstreams = upstream_names(&info, build);
    debug!(project = name, ?upstreams, "upstream projects");

    let mut artifacts = BTreeMap::new();
    if let (Some(build), Some(number)) = (build, build_number) {
      for artifact in &build.artifacts {
        let url = backend
          .job_url(name, &format!("{}/artifact/{}", number, artifact.relative_path))
          .map_err(|e| ResolutionError::backend(name, e))?;
        artifacts.insert(artifact.file_name.clone(), url);
      }
    }

    Ok(Self {
      name: name.to_string(),
      build_number,
      last_stable_build,
      last_successful_build,
      build_timestamp: build.map(|b| b.timestamp),
      scm: extraction.locations,
      upstreams,
      artifacts,
      warnings,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn build_number(&self) -> Option<u64> {
    self.build_number
  }

  pub fn last_stable_build(&self) -> Option<u64> {
    self.last_stable_build
  }

  pub fn last_successful_build(&self) -> Option<u64> {
    self.last_successful_build
  }

  pub fn build_timestamp(&self) -> Option<i64> {
    self.build_timestamp
  }

  pub fn scm_info(&self) -> Option<&[ScmLocation]> {
    self.scm.as_deref()
  }

  pub fn upstream_names(&self) -> &[String] {
    &self.upstreams
  }

  pub fn artifact_map(&self) -> &BTreeMap<String, String> {
    &self.artifacts
  }

  pub fn warnings(&self) -> &[SoftWarning] {
    &self.warnings
  }

  /// Fetch the archived manifest named `filename`, `None` if the build has none.
  pub fn dependency_manifest_content(
    &self,
    backend: &dyn CiBackend,
    filename: &str,
  ) -> Result<Option<String>, ResolutionError> {
    let Some(url) = self.artifacts.get(filename) else {
      debug!(
        project = %self.name,
        build = ?self.build_number,
        filename,
        "no manifest found among artifacts"
      );
      return Ok(None);
    };

    debug!(project = %self.name, url, "fetching manifest");
    let content = backend
      .fetch_text(url)
      .map_err(|e| ResolutionError::backend(&self.name, e))?;
    Ok(Some(content))
  }

  /// Ask the CI server to stop this build.
  pub fn abort(&self, backend: &dyn CiBackend) -> Result<(), AbortError> {
    let Some(build) = self.build_number else {
      return Err(AbortError::NoBuild {
        project: self.name.clone(),
      });
    };

    debug!(project = %self.name, build, "aborting build");
    backend.abort_build(&self.name, build).map_err(|e| AbortError::Rejected {
      project: self.name.clone(),
      build,
      source: e,
    })
  }
}

fn find_build<'a>(info: &'a JobInfo, name: &str, number: u64) -> Result<&'a BuildInfo, ResolutionError> {
  info.build(number).ok_or_else(|| ResolutionError::InvalidBuild {
    project: name.to_string(),
    build: number,
    valid: info.build_numbers(),
  })
}

/// Project-level upstreams, falling back to the upstream causes of the resolved build.
fn upstream_names(info: &JobInfo, build: Option<&BuildInfo>) -> Vec<String> {
  let configured: Vec<String> = info.upstream_projects.iter().map(|p| p.name.clone()).collect();
  if !configured.is_empty() {
    return dedup_names(configured);
  }
  dedup_names(build.map(BuildInfo::upstream_causes).unwrap_or_default())
}
