//! Shared test helpers for CLI integration tests.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

/// Isolated working directory and a mock CI server.
pub struct TestEnv {
  pub temp: TempDir,
  pub server: ServerGuard,
  mocks: Vec<Mock>,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
      server: mockito::Server::new(),
      mocks: Vec::new(),
    }
  }

  /// depman run in the working directory against the mock server.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("depman");
    cmd
      .current_dir(self.temp.path())
      .env("HOME", self.temp.path())
      .env("XDG_CONFIG_HOME", self.temp.path().join(".config"))
      .env_remove("JENKINS_CREDENTIALS")
      .env_remove("DEPMAN_SERVER")
      .env_remove("DEPMAN_REPOSITORY")
      .env_remove("DEPMAN_MANIFEST")
      .env_remove("DEPMAN_VIEW_USER")
      .arg("--server")
      .arg(self.server.url());
    cmd
  }

  pub fn read_file(&self, name: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(name)).unwrap()
  }

  /// Serve a freestyle job whose builds ran `age_hours` ago, one Subversion module per job.
  pub fn job(&mut self, name: &str, builds: &[(u64, u64)], upstreams: &[&str], artifacts: &[&str], age_hours: i64) {
    let module = format!("svn://scm/{}/trunk", name);
    let now = std::time::SystemTime::now()
      .duration_since(std::time::UNIX_EPOCH)
      .unwrap()
      .as_millis() as i64;
    let builds_json: Vec<_> = builds
      .iter()
      .map(|(number, revision)| {
        json!({
          "number": number,
          "timestamp": now - age_hours * 3_600_000,
          "artifacts": artifacts
            .iter()
            .map(|a| json!({"fileName": a, "relativePath": a}))
            .collect::<Vec<_>>(),
          "changeSet": {"kind": "svn", "items": [], "revisions": [{"module": module, "revision": revision}]},
        })
      })
      .collect();
    let stable = builds.first().map(|(n, _)| json!({"number": n}));
    let info = json!({
      "name": name,
      "builds": builds_json,
      "lastStableBuild": stable,
      "lastSuccessfulBuild": stable,
      "upstreamProjects": upstreams.iter().map(|u| json!({"name": u})).collect::<Vec<_>>(),
    });

    self.mocks.push(
      self
        .server
        .mock("GET", format!("/job/{}/api/json", name).as_str())
        .match_query(Matcher::Any)
        .with_body(info.to_string())
        .create(),
    );
    self.mocks.push(
      self
        .server
        .mock("GET", format!("/job/{}/config.xml", name).as_str())
        .with_body(format!(
          "<project><scm class=\"hudson.scm.SubversionSCM\"><locations><hudson.scm.SubversionSCM_-ModuleLocation><remote>{}</remote></hudson.scm.SubversionSCM_-ModuleLocation></locations></scm></project>",
          module
        ))
        .create(),
    );
  }

  pub fn artifact(&mut self, job: &str, build: u64, path: &str, body: &str) {
    self.mocks.push(
      self
        .server
        .mock("GET", format!("/job/{}/{}/artifact/{}", job, build, path).as_str())
        .with_body(body)
        .create(),
    );
  }

  pub fn expect_stop(&mut self, job: &str, build: u64) -> Mock {
    self
      .server
      .mock("POST", format!("/job/{}/{}/stop", job, build).as_str())
      .with_status(200)
      .expect(1)
      .create()
  }
}
