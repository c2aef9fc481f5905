//! Shared helpers: a mock CI server and fixtures.

use std::path::PathBuf;

use depman_lib::ci::JenkinsClient;
use depman_lib::graph::GraphOptions;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{Value, json};

pub const MANIFEST: &str = "dependencies.txt";
pub const REPOSITORY: &str = "3rd-party";

pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

pub fn options() -> GraphOptions {
  GraphOptions {
    manifest_filename: MANIFEST.into(),
    repository_project: REPOSITORY.into(),
    recursive: true,
  }
}

/// A build record as the server returns it at depth 1.
pub fn build(number: u64, revisions: &[(&str, u64)], artifacts: &[&str]) -> Value {
  json!({
    "number": number,
    "timestamp": 1_700_000_000_000i64 + number as i64 * 60_000,
    "result": "SUCCESS",
    "artifacts": artifacts
      .iter()
      .map(|path| json!({
        "fileName": path.rsplit('/').next().unwrap_or(path),
        "relativePath": path,
        "displayPath": path,
      }))
      .collect::<Vec<_>>(),
    "changeSet": {
      "_class": "hudson.scm.SubversionChangeLogSet",
      "kind": "svn",
      "items": [],
      "revisions": revisions
        .iter()
        .map(|(module, revision)| json!({"module": module, "revision": revision}))
        .collect::<Vec<_>>(),
    },
  })
}

/// app <- lib <- base; lib archived a manifest listing base@3.
pub fn app_lib_base() -> CiServer {
  let mut ci = CiServer::new();
  ci.job(
    "base",
    vec![build(3, &[("svn://scm/base/trunk", 30)], &[])],
    Some(3),
    &[],
    &["svn://scm/base/trunk"],
  );
  ci.job(
    "lib",
    vec![build(5, &[("svn://scm/lib/trunk", 50)], &["target/lib.jar", MANIFEST])],
    Some(5),
    &["base"],
    &["svn://scm/lib/trunk"],
  );
  ci.job(
    "app",
    vec![build(10, &[("svn://scm/app/trunk", 100)], &["target/app.war"])],
    Some(10),
    &["lib"],
    &["svn://scm/app/trunk"],
  );
  ci.artifact("lib", 5, MANIFEST, &fixture_content("lib_dependencies.txt"));
  ci.artifact("lib", 5, "target/lib.jar", "lib-bytes");
  ci.artifact("app", 10, "target/app.war", "app-bytes");
  ci
}

/// Mock CI server with a client pointed at it.
pub struct CiServer {
  pub server: ServerGuard,
  mocks: Vec<Mock>,
}

impl CiServer {
  pub fn new() -> Self {
    Self {
      server: mockito::Server::new(),
      mocks: Vec::new(),
    }
  }

  pub fn client(&self) -> JenkinsClient {
    JenkinsClient::new(&self.server.url(), None).unwrap()
  }

  /// Serve `job/<name>/api/json` and a freestyle `config.xml` with one location per module.
  pub fn job(&mut self, name: &str, builds: Vec<Value>, stable: Option<u64>, upstreams: &[&str], modules: &[&str]) {
    let locations: String = modules
      .iter()
      .map(|m| {
        format!(
          "<hudson.scm.SubversionSCM_-ModuleLocation><remote>{}</remote><local>.</local></hudson.scm.SubversionSCM_-ModuleLocation>",
          m
        )
      })
      .collect();
    let config = format!(
      "<?xml version='1.1' encoding='UTF-8'?>\n<project><description/><scm class=\"hudson.scm.SubversionSCM\"><locations>{}</locations></scm></project>",
      locations
    );
    self.job_with_config(name, builds, stable, upstreams, &config);
  }

  /// Serve `job/<name>/api/json` and the given `config.xml`.
  pub fn job_with_config(
    &mut self,
    name: &str,
    builds: Vec<Value>,
    stable: Option<u64>,
    upstreams: &[&str],
    config: &str,
  ) {
    let base = self.server.url();
    let build_ref = |n: u64| json!({"number": n, "url": format!("{}/job/{}/{}/", base, name, n)});
    let info = json!({
      "_class": "hudson.model.FreeStyleProject",
      "name": name,
      "url": format!("{}/job/{}/", base, name),
      "builds": builds,
      "lastStableBuild": stable.map(build_ref),
      "lastSuccessfulBuild": stable.map(build_ref),
      "upstreamProjects": upstreams.iter().map(|u| json!({"name": u})).collect::<Vec<_>>(),
    });
    let info_mock = self
      .server
      .mock("GET", format!("/job/{}/api/json", name).as_str())
      .match_query(Matcher::Any)
      .with_body(info.to_string())
      .create();
    let config_mock = self
      .server
      .mock("GET", format!("/job/{}/config.xml", name).as_str())
      .with_body(config)
      .create();

    self.mocks.push(info_mock);
    self.mocks.push(config_mock);
  }

  /// Serve a user's personal view listing `jobs`.
  pub fn view(&mut self, user: &str, view: &str, jobs: &[&str]) {
    let base = self.server.url();
    let body = json!({
      "name": view,
      "jobs": jobs
        .iter()
        .map(|j| json!({"name": j, "url": format!("{}/job/{}/", base, j)}))
        .collect::<Vec<_>>(),
    });
    let mock = self
      .server
      .mock("GET", format!("/user/{}/my-views/view/{}/api/json", user, view).as_str())
      .match_query(Matcher::Any)
      .with_body(body.to_string())
      .create();
    self.mocks.push(mock);
  }

  /// Serve an archived artifact of a build.
  pub fn artifact(&mut self, job: &str, build: u64, path: &str, body: &str) {
    let mock = self
      .server
      .mock("GET", format!("/job/{}/{}/artifact/{}", job, build, path).as_str())
      .with_body(body)
      .create();
    self.mocks.push(mock);
  }

  /// Expect exactly one stop request for a build.
  pub fn expect_stop(&mut self, job: &str, build: u64) -> Mock {
    self
      .server
      .mock("POST", format!("/job/{}/{}/stop", job, build).as_str())
      .with_status(200)
      .expect(1)
      .create()
  }
}
