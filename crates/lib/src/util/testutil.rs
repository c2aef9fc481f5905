//! Test utilities for depman-lib.
//!
//! [`FakeBackend`] answers [`CiBackend`] calls from in-memory tables, so project
//! resolution and graph building can be tested without a server. The remaining
//! helpers build the job configurations and build records those tables hold.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ci::{BuildInfo, BuildRef, ChangeSet, CiBackend, CiError, JobInfo, ProjectLink, SvnRevision};

/// Base URL every [`FakeBackend`] URL starts with.
pub const FAKE_BASE: &str = "http://ci/";

/// In-memory CI server.
#[derive(Debug, Default)]
pub struct FakeBackend {
  jobs: HashMap<String, JobInfo>,
  configs: HashMap<String, String>,
  texts: HashMap<String, String>,
  views: HashMap<(String, String), Vec<ProjectLink>>,
  aborted: RefCell<Vec<(String, u64)>>,
  downloads: RefCell<Vec<(String, PathBuf)>>,
  /// When set, every abort request fails with HTTP 403.
  pub reject_abort: bool,
}

impl FakeBackend {
  /// Register a job under `info.name` with its `config.xml`.
  pub fn add_job(&mut self, info: JobInfo, config_xml: &str) {
    self.configs.insert(info.name.clone(), config_xml.to_string());
    self.jobs.insert(info.name.clone(), info);
  }

  /// Serve `content` for `url` from `fetch_text` and `download`.
  pub fn add_text(&mut self, url: &str, content: &str) {
    self.texts.insert(url.to_string(), content.to_string());
  }

  pub fn add_view(&mut self, user: &str, view: &str, jobs: &[&str]) {
    let links = jobs
      .iter()
      .map(|name| ProjectLink {
        name: name.to_string(),
        url: format!("{}job/{}/", FAKE_BASE, name),
      })
      .collect();
    self.views.insert((user.to_string(), view.to_string()), links);
  }

  /// Builds that were asked to stop, in call order.
  pub fn aborted(&self) -> Vec<(String, u64)> {
    self.aborted.borrow().clone()
  }

  /// URLs downloaded and their destinations, in call order.
  pub fn downloads(&self) -> Vec<(String, PathBuf)> {
    self.downloads.borrow().clone()
  }

  fn not_found(url: String) -> CiError {
    CiError::Status {
      url,
      status: 404,
      body: "Not Found".to_string(),
    }
  }
}

impl CiBackend for FakeBackend {
  fn job_info(&self, job: &str, _depth: u32) -> Result<JobInfo, CiError> {
    self
      .jobs
      .get(job)
      .cloned()
      .ok_or_else(|| Self::not_found(format!("{}job/{}/api/json", FAKE_BASE, job)))
  }

  fn job_config(&self, job: &str) -> Result<String, CiError> {
    self
      .configs
      .get(job)
      .cloned()
      .ok_or_else(|| Self::not_found(format!("{}job/{}/config.xml", FAKE_BASE, job)))
  }

  fn job_url(&self, job: &str, suffix: &str) -> Result<String, CiError> {
    Ok(format!("{}job/{}/{}", FAKE_BASE, job, suffix))
  }

  fn fetch_text(&self, url: &str) -> Result<String, CiError> {
    self
      .texts
      .get(url)
      .cloned()
      .ok_or_else(|| Self::not_found(url.to_string()))
  }

  fn download(&self, url: &str, dest: &Path) -> Result<u64, CiError> {
    let content = self.texts.get(url).cloned().unwrap_or_else(|| format!("content of {}", url));
    let io_err = |e| CiError::Io {
      path: dest.display().to_string(),
      source: e,
    };
    if let Some(parent) = dest.parent() {
      fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(dest, &content).map_err(io_err)?;
    self.downloads.borrow_mut().push((url.to_string(), dest.to_path_buf()));
    Ok(content.len() as u64)
  }

  fn abort_build(&self, job: &str, build: u64) -> Result<(), CiError> {
    if self.reject_abort {
      return Err(CiError::Status {
        url: format!("{}job/{}/{}/stop", FAKE_BASE, job, build),
        status: 403,
        body: "forbidden".to_string(),
      });
    }
    self.aborted.borrow_mut().push((job.to_string(), build));
    Ok(())
  }

  fn view_jobs(&self, user: &str, view: &str) -> Result<Vec<ProjectLink>, CiError> {
    self
      .views
      .get(&(user.to_string(), view.to_string()))
      .cloned()
      .ok_or_else(|| Self::not_found(format!("{}user/{}/my-views/view/{}/api/json", FAKE_BASE, user, view)))
  }
}

/// A job with the given builds; `stable` also becomes the last successful build.
pub fn job_info(name: &str, builds: Vec<BuildInfo>, stable: Option<u64>) -> JobInfo {
  let build_ref = |number| BuildRef {
    number,
    url: format!("{}job/{}/{}/", FAKE_BASE, name, number),
  };
  JobInfo {
    name: name.to_string(),
    url: format!("{}job/{}/", FAKE_BASE, name),
    builds,
    last_stable_build: stable.map(build_ref),
    last_successful_build: stable.map(build_ref),
    upstream_projects: Vec::new(),
  }
}

/// A build whose Subversion change set records `(module, revision)` pairs.
pub fn svn_build(number: u64, revisions: &[(&str, &str)]) -> BuildInfo {
  BuildInfo {
    number,
    timestamp: 1_700_000_000_000 + number as i64 * 60_000,
    result: Some("SUCCESS".to_string()),
    change_set: Some(ChangeSet {
      kind: Some("svn".to_string()),
      items: Vec::new(),
      revisions: revisions
        .iter()
        .map(|(module, revision)| SvnRevision {
          module: module.to_string(),
          revision: revision.to_string(),
        })
        .collect(),
    }),
    ..Default::default()
  }
}

/// Freestyle `config.xml` with one Subversion module location per entry.
pub fn svn_project_config(locations: &[&str]) -> String {
  let modules: String = locations
    .iter()
    .map(|l| {
      format!(
        "<hudson.scm.SubversionSCM_-ModuleLocation><remote>{}</remote><local>.</local></hudson.scm.SubversionSCM_-ModuleLocation>",
        l
      )
    })
    .collect();
  format!(
    "<?xml version='1.0' encoding='UTF-8'?>\n<project><scm class=\"hudson.scm.SubversionSCM\"><locations>{}</locations></scm></project>",
    modules
  )
}

/// Multibranch pipeline `config.xml` with one git remote per entry.
pub fn git_pipeline_config(urls: &[&str]) -> String {
  let remotes: String = urls
    .iter()
    .map(|u| format!("<hudson.plugins.git.UserRemoteConfig><url>{}</url></hudson.plugins.git.UserRemoteConfig>", u))
    .collect();
  format!(
    "<flow-definition><properties><org.jenkinsci.plugins.workflow.multibranch.BranchJobProperty><branch><scm class=\"hudson.plugins.git.GitSCM\"><userRemoteConfigs>{}</userRemoteConfigs></scm></branch></org.jenkinsci.plugins.workflow.multibranch.BranchJobProperty></properties></flow-definition>",
    remotes
  )
}
