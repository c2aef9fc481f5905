//! Basic-auth credential discovery for the CI server.
//!
//! Credentials are looked up in order:
//! 1. An explicit `user:password` value (command line or config file)
//! 2. A `machine <host>` entry in `~/.netrc`
//! 3. The `JENKINS_CREDENTIALS` environment variable
//!
//! Nothing is ever written back; a missing value means requests go out unauthenticated.

use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::consts::CREDENTIALS_ENV;
use crate::platform::paths::netrc_file;

/// A username/password pair for HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &"***")
      .finish()
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
  #[error("credentials must have the form 'user:password' (source: {source_name})")]
  Malformed { source_name: &'static str },
}

impl Credentials {
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: password.into(),
    }
  }

  /// Parse a `user:password` string. The password may itself contain colons.
  pub fn parse(value: &str, source_name: &'static str) -> Result<Self, CredentialsError> {
    match value.split_once(':') {
      Some((user, pass)) if !user.is_empty() => Ok(Self::new(user, pass)),
      _ => Err(CredentialsError::Malformed { source_name }),
    }
  }

  /// Discover credentials for `host`, trying the explicit value, `~/.netrc`, then the environment.
  pub fn discover(explicit: Option<&str>, host: Option<&str>) -> Result<Option<Self>, CredentialsError> {
    if let Some(value) = explicit {
      debug!("using explicitly provided credentials");
      return Self::parse(value, "explicit").map(Some);
    }

    if let Some(host) = host {
      debug!(host, "no credentials provided, looking in .netrc");
      if let Some(creds) = from_netrc_file(&netrc_file(), host) {
        debug!(host, "found credentials in .netrc");
        return Ok(Some(creds));
      }
    }

    debug!(var = CREDENTIALS_ENV, "looking for credentials in environment");
    match std::env::var(CREDENTIALS_ENV) {
      Ok(value) if !value.is_empty() => Self::parse(&value, CREDENTIALS_ENV).map(Some),
      _ => {
        debug!("no credentials found");
        Ok(None)
      }
    }
  }
}

/// Read the entry for `host` from a netrc file. Unreadable files count as absent.
fn from_netrc_file(path: &Path, host: &str) -> Option<Credentials> {
  let content = fs::read_to_string(path).ok()?;
  parse_netrc(&content, host)
}

/// Minimal netrc reader: `machine`, `login` and `password` tokens.
///
/// Only a `machine` entry naming `host` counts; a `default` entry is never used.
pub fn parse_netrc(content: &str, host: &str) -> Option<Credentials> {
  let mut tokens = content.split_whitespace();
  // (is_target, login, password) of the entry being read
  let mut current: Option<(bool, Option<String>, Option<String>)> = None;

  let finish = |entry: Option<(bool, Option<String>, Option<String>)>| match entry {
    Some((true, Some(login), password)) => Some(Credentials::new(login, password.unwrap_or_default())),
    _ => None,
  };

  while let Some(token) = tokens.next() {
    match token {
      "machine" => {
        if let Some(creds) = finish(current.take()) {
          return Some(creds);
        }
        let name = tokens.next().unwrap_or_default();
        current = Some((name == host, None, None));
      }
      "default" => {
        if let Some(creds) = finish(current.take()) {
          return Some(creds);
        }
        current = Some((false, None, None));
      }
      "login" => {
        if let Some(entry) = current.as_mut() {
          entry.1 = tokens.next().map(str::to_string);
        }
      }
      "password" => {
        if let Some(entry) = current.as_mut() {
          entry.2 = tokens.next().map(str::to_string);
        }
      }
      "account" | "macdef" => {
        tokens.next();
      }
      _ => {}
    }
  }
  finish(current)
}
