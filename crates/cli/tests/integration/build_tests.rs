//! Commands talking to a mock CI server.

use predicates::prelude::*;

use super::common::TestEnv;

/// app <- lib <- base; lib archived a manifest listing base@3.
fn app_lib_base(age_hours: i64) -> TestEnv {
  let mut env = TestEnv::new();
  env.job("base", &[(3, 30)], &[], &[], age_hours);
  env.job("lib", &[(5, 50)], &["base"], &["dependencies.txt"], age_hours);
  env.job("app", &[(10, 100)], &["lib"], &[], age_hours);
  env.artifact(
    "lib",
    5,
    "dependencies.txt",
    "### Project: lib\n### Build: 5\n### SVN: svn://scm/lib/trunk     (rev: 50)\n\nbase\n   Added by: lib\n   Build: 3\n   SVN/GIT: svn://scm/base/trunk     (rev: 30)\n",
  );
  env
}

mod build {
  use super::*;

  #[test]
  fn writes_manifest_to_working_directory() {
    let env = app_lib_base(1);

    env
      .cmd()
      .args(["build", "app", "10"])
      .assert()
      .success()
      .stdout(predicate::str::contains("Dependency file created"));

    let manifest = env.read_file("dependencies.txt");
    assert!(manifest.contains("### Project: app\n### Build: 10\n### SVN: svn://scm/app/trunk     (rev: 100)\n"));
    assert!(manifest.contains("lib\n   Added by: app\n   Build: 5\n"));
    assert!(manifest.contains("base\n   Added by: lib\n   Build: 3\n   SVN/GIT: svn://scm/base/trunk     (rev: 30)\n"));
  }

  #[test]
  fn conflict_aborts_build() {
    let mut env = TestEnv::new();
    env.job("base", &[(4, 40), (3, 30)], &[], &[], 1);
    env.job("left", &[(1, 10)], &[], &["dependencies.txt"], 1);
    env.job("right", &[(2, 20)], &[], &["dependencies.txt"], 1);
    env.job("app", &[(7, 70)], &["left", "right"], &[], 1);
    env.artifact(
      "left",
      1,
      "dependencies.txt",
      "### Project: left\n### Build: 1\n\nbase\n   Added by: left\n   Build: 3\n",
    );
    env.artifact(
      "right",
      2,
      "dependencies.txt",
      "### Project: right\n### Build: 2\n\nbase\n   Added by: right\n   Build: 4\n",
    );
    let stop = env.expect_stop("app", 7);

    env
      .cmd()
      .args(["build", "app", "7"])
      .assert()
      .failure()
      .stderr(predicate::str::contains("project base already present, with different build-number"));

    stop.assert();
    assert!(!env.temp.path().join("dependencies.txt").exists());
  }
}

mod age {
  use super::*;

  #[test]
  fn recent_job_passes() {
    let env = app_lib_base(2);
    env.cmd().args(["assert-job-age", "app", "3"]).assert().success();
  }

  #[test]
  fn old_job_fails() {
    let env = app_lib_base(30);
    env
      .cmd()
      .args(["assert-job-age", "app", "24"])
      .assert()
      .failure()
      .stderr(predicate::str::contains("is older than maximum age: 86400 seconds"));
  }

  #[test]
  fn dependency_age_is_checked() {
    let env = app_lib_base(30);
    env
      .cmd()
      .args(["assert-dependency-age", "app", "10", "base", "48"])
      .assert()
      .success();
    env
      .cmd()
      .args(["assert-dependency-age", "app", "10", "base", "24"])
      .assert()
      .failure()
      .stderr(predicate::str::contains("of base build 3"));
  }
}
