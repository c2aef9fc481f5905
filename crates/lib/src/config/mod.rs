//! Runtime settings.
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. The config file (`--config`, or `config.toml` in the config directory)
//! 3. Environment variables (`DEPMAN_SERVER`, `DEPMAN_REPOSITORY`, `DEPMAN_MANIFEST`, `DEPMAN_VIEW_USER`)
//! 4. Command-line overrides, applied by the caller
//!
//! # Config File Format
//!
//! ```toml
//! server = "https://ci.example.com/"
//! repository_project = "3rd-party-dependencies"
//! manifest_filename = "dependencies.txt"
//! view_user = "release"
//! credentials = "builder:secret"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::ci::auth::{Credentials, CredentialsError};
use crate::ci::{CiError, JenkinsClient};
use crate::consts::{DEFAULT_MANIFEST_FILENAME, DEFAULT_REPOSITORY_PROJECT, DEFAULT_SERVER};
use crate::graph::GraphOptions;
use crate::platform::paths::config_file;

/// Errors loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{}': {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file '{}': {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error(transparent)]
  Credentials(#[from] CredentialsError),

  #[error("failed to create CI client: {0}")]
  Client(#[from] CiError),
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// Base URL of the CI server.
  pub server: String,
  /// Name of the job that archives third-party artifacts.
  pub repository_project: String,
  /// Name of the manifest file, both locally and as an archived artifact.
  pub manifest_filename: String,
  /// Owner of the personal views used for packaging.
  pub view_user: Option<String>,
  /// Explicit `user:password` credentials.
  pub credentials: Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      server: DEFAULT_SERVER.to_string(),
      repository_project: DEFAULT_REPOSITORY_PROJECT.to_string(),
      manifest_filename: DEFAULT_MANIFEST_FILENAME.to_string(),
      view_user: None,
      credentials: None,
    }
  }
}

/// On-disk form of [`Settings`]; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
  server: Option<String>,
  repository_project: Option<String>,
  manifest_filename: Option<String>,
  view_user: Option<String>,
  credentials: Option<String>,
}

impl Settings {
  /// Default location of the config file.
  pub fn default_path() -> PathBuf {
    config_file()
  }

  /// Load settings from `path` (or the default location) and the environment.
  ///
  /// An explicitly given path must exist; the default location is optional.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let mut settings = Self::default();

    let (path, required) = match path {
      Some(p) => (p.to_path_buf(), true),
      None => (Self::default_path(), false),
    };

    match fs::read_to_string(&path) {
      Ok(content) => {
        debug!(path = %path.display(), "loading config file");
        let file: SettingsFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
          path: path.clone(),
          source: e,
        })?;
        settings.merge_file(file);
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
        debug!(path = %path.display(), "no config file");
      }
      Err(e) => return Err(ConfigError::Read { path, source: e }),
    }

    settings.merge_env();
    Ok(settings)
  }

  fn merge_file(&mut self, file: SettingsFile) {
    if let Some(server) = file.server {
      self.server = server;
    }
    if let Some(repository) = file.repository_project {
      self.repository_project = repository;
    }
    if let Some(manifest) = file.manifest_filename {
      self.manifest_filename = manifest;
    }
    if file.view_user.is_some() {
      self.view_user = file.view_user;
    }
    if file.credentials.is_some() {
      self.credentials = file.credentials;
    }
  }

  fn merge_env(&mut self) {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    if let Some(server) = var("DEPMAN_SERVER") {
      self.server = server;
    }
    if let Some(repository) = var("DEPMAN_REPOSITORY") {
      self.repository_project = repository;
    }
    if let Some(manifest) = var("DEPMAN_MANIFEST") {
      self.manifest_filename = manifest;
    }
    if let Some(user) = var("DEPMAN_VIEW_USER") {
      self.view_user = Some(user);
    }
  }

  /// Recursive graph options for the configured repository and manifest name.
  pub fn graph_options(&self) -> GraphOptions {
    GraphOptions {
      manifest_filename: self.manifest_filename.clone(),
      repository_project: self.repository_project.clone(),
      recursive: true,
    }
  }

  /// Build a CI client for the configured server, discovering credentials.
  pub fn client(&self) -> Result<JenkinsClient, ConfigError> {
    let anonymous = JenkinsClient::new(&self.server, None)?;
    let credentials = Credentials::discover(self.credentials.as_deref(), anonymous.host())?;
    Ok(JenkinsClient::new(&self.server, credentials)?)
  }
}
