//! Blocking HTTP client for a Jenkins-compatible CI server.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::auth::Credentials;
use super::types::{JobInfo, ProjectLink, ViewInfo};
use super::{CiBackend, CiError};

/// Default timeout for a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the CI server's JSON API.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
  base: Url,
  credentials: Option<Credentials>,
  http: Client,
}

impl JenkinsClient {
  /// Create a client for the server at `base_url`. A trailing slash is added if missing.
  pub fn new(base_url: &str, credentials: Option<Credentials>) -> Result<Self, CiError> {
    let mut normalized = base_url.to_string();
    if !normalized.ends_with('/') {
      normalized.push('/');
    }
    let base = Url::parse(&normalized).map_err(|_| CiError::InvalidUrl(base_url.to_string()))?;

    let http = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| CiError::Http {
        url: base.to_string(),
        source: e,
      })?;

    Ok(Self {
      base,
      credentials,
      http,
    })
  }

  /// The server base URL, always ending in `/`.
  pub fn base_url(&self) -> &str {
    self.base.as_str()
  }

  /// Host name of the server, used to look up `.netrc` entries.
  pub fn host(&self) -> Option<&str> {
    self.base.host_str()
  }

  fn join(&self, path: &str) -> Result<Url, CiError> {
    self.base.join(path).map_err(|_| CiError::InvalidUrl(path.to_string()))
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.credentials {
      Some(creds) => request.basic_auth(&creds.username, Some(&creds.password)),
      None => request,
    }
  }

  fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, CiError> {
    debug!(url, "querying");
    let response = self.authorize(request).send().map_err(|e| CiError::Http {
      url: url.to_string(),
      source: e,
    })?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().unwrap_or_default();
      return Err(CiError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
      });
    }
    Ok(response)
  }

  fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T, CiError> {
    let url_str = url.to_string();
    let response = self.send(&url_str, self.http.get(url).query(query))?;
    let body = response.text().map_err(|e| CiError::Http {
      url: url_str.clone(),
      source: e,
    })?;
    serde_json::from_str(&body).map_err(|e| CiError::Decode {
      url: url_str,
      source: e,
    })
  }
}

impl CiBackend for JenkinsClient {
  fn job_info(&self, job: &str, depth: u32) -> Result<JobInfo, CiError> {
    debug!(job, depth, "getting project info");
    let url = self.join(&format!("job/{}/api/json", job))?;
    self.get_json(url, &[("depth", depth.to_string())])
  }

  fn job_config(&self, job: &str) -> Result<String, CiError> {
    debug!(job, "getting project config");
    let url = self.join(&format!("job/{}/config.xml", job))?;
    let url_str = url.to_string();
    let response = self.send(&url_str, self.http.get(url))?;
    response.text().map_err(|e| CiError::Http {
      url: url_str,
      source: e,
    })
  }

  fn job_url(&self, job: &str, suffix: &str) -> Result<String, CiError> {
    Ok(self.join(&format!("job/{}/{}", job, suffix))?.to_string())
  }

  fn fetch_text(&self, url: &str) -> Result<String, CiError> {
    let response = self.send(url, self.http.get(url))?;
    response.text().map_err(|e| CiError::Http {
      url: url.to_string(),
      source: e,
    })
  }

  fn download(&self, url: &str, dest: &Path) -> Result<u64, CiError> {
    info!(url, dest = %dest.display(), "downloading");
    let io_err = |e| CiError::Io {
      path: dest.display().to_string(),
      source: e,
    };

    if let Some(parent) = dest.parent() {
      fs::create_dir_all(parent).map_err(io_err)?;
    }

    let response = self.send(url, self.http.get(url))?;
    let bytes = response.bytes().map_err(|e| CiError::Http {
      url: url.to_string(),
      source: e,
    })?;

    let mut file = File::create(dest).map_err(io_err)?;
    file.write_all(&bytes).map_err(io_err)?;

    Ok(bytes.len() as u64)
  }

  fn abort_build(&self, job: &str, build: u64) -> Result<(), CiError> {
    debug!(job, build, "aborting build");
    let url = self.join(&format!("job/{}/{}/stop", job, build))?;
    let url_str = url.to_string();
    self.send(&url_str, self.http.post(url))?;
    Ok(())
  }

  fn view_jobs(&self, user: &str, view: &str) -> Result<Vec<ProjectLink>, CiError> {
    let url = self.join(&format!("user/{}/my-views/view/{}/api/json", user, view))?;
    let info: ViewInfo = self.get_json(url, &[])?;
    Ok(info.jobs)
  }
}
