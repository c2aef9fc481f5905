//! CI server access.
//!
//! Everything the dependency tracker needs from the CI server goes through the
//! [`CiBackend`] trait. [`JenkinsClient`] is the production implementation; tests
//! substitute an in-memory backend.
//!
//! # Modules
//!
//! - [`auth`] - Credential discovery (explicit value, `.netrc`, environment)
//! - [`client`] - Blocking HTTP client for the server's JSON API
//! - [`types`] - Declared records for the JSON responses

pub mod auth;
pub mod client;
mod types;

use std::path::Path;

use thiserror::Error;

pub use client::JenkinsClient;
pub use types::*;

/// Errors talking to the CI server.
#[derive(Debug, Error)]
pub enum CiError {
  /// The request could not be sent or the response body could not be read.
  #[error("request to '{url}' failed: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("request to '{url}' returned HTTP {status}: {body}")]
  Status { url: String, status: u16, body: String },

  /// The response was not the JSON document we expected.
  #[error("could not decode response from '{url}': {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },

  /// A job configuration was not well-formed XML.
  #[error("invalid configuration XML for '{job}': {message}")]
  Xml { job: String, message: String },

  /// A base URL or path could not be joined into a request URL.
  #[error("invalid URL '{0}'")]
  InvalidUrl(String),

  #[error("IO error writing '{path}': {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// Operations the dependency tracker performs against the CI server.
///
/// All calls are blocking and issued one at a time.
pub trait CiBackend {
  /// Project information including its builds, at the given API depth.
  fn job_info(&self, job: &str, depth: u32) -> Result<JobInfo, CiError>;

  /// The raw `config.xml` of a project.
  fn job_config(&self, job: &str) -> Result<String, CiError>;

  /// Absolute URL for `job/<job>/<suffix>`.
  fn job_url(&self, job: &str, suffix: &str) -> Result<String, CiError>;

  /// Fetch an arbitrary URL as text (used for manifest artifacts).
  fn fetch_text(&self, url: &str) -> Result<String, CiError>;

  /// Download a URL to `dest`, returning the number of bytes written.
  fn download(&self, url: &str, dest: &Path) -> Result<u64, CiError>;

  /// Ask the server to stop a running build.
  fn abort_build(&self, job: &str, build: u64) -> Result<(), CiError>;

  /// Jobs of a user's personal view.
  fn view_jobs(&self, user: &str, view: &str) -> Result<Vec<ProjectLink>, CiError>;
}
