//! Manifest flows against a mock CI server.

use std::fs;

use depman_lib::manage::{add_to_manifest, build_manifest};
use depman_lib::manifest::ManifestDocument;
use depman_lib::project::ProjectKind;
use tempfile::TempDir;

use super::common::*;

/// Manifest text without its `### File created:` line.
fn without_timestamp(text: &str) -> String {
  text
    .lines()
    .filter(|l| !l.starts_with("### File created:"))
    .map(|l| format!("{}\n", l))
    .collect()
}

mod build {
  use super::*;

  #[test]
  fn writes_transitive_manifest() {
    let ci = app_lib_base();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(MANIFEST);

    let set = build_manifest(&ci.client(), "app", 10, &path, &options()).unwrap();
    assert_eq!(set.entries().len(), 2);

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("### File created: "));
    assert_eq!(
      without_timestamp(&written),
      without_timestamp(&fixture_content("app_dependencies.txt"))
    );
  }

  #[test]
  fn conflict_stops_build_and_writes_nothing() {
    let mut ci = CiServer::new();
    ci.job(
      "base",
      vec![build(4, &[], &[]), build(3, &[], &[])],
      Some(4),
      &[],
      &[],
    );
    for (name, number, base) in [("left", 1, 3), ("right", 2, 4)] {
      ci.job(name, vec![build(number, &[], &[MANIFEST])], Some(number), &[], &[]);
      ci.artifact(
        name,
        number,
        MANIFEST,
        &format!(
          "### Project: {name}\n### Build: {number}\n\nbase\n   Added by: {name}\n   Build: {base}\n"
        ),
      );
    }
    ci.job("app", vec![build(7, &[], &[])], Some(7), &["left", "right"], &[]);
    let stop = ci.expect_stop("app", 7);

    let temp = TempDir::new().unwrap();
    let path = temp.path().join(MANIFEST);
    let err = build_manifest(&ci.client(), "app", 7, &path, &options()).unwrap_err();

    stop.assert();
    let conflict = err.conflict().unwrap();
    assert_eq!(conflict.name, "base");
    assert_eq!((conflict.present, conflict.new), (Some(3), Some(4)));
    assert!(!path.exists());
  }
}

mod add {
  use super::*;

  fn with_repository(mut ci: CiServer) -> CiServer {
    ci.job(
      REPOSITORY,
      vec![build(
        7,
        &[],
        &["junit/junit-4.12.jar", "junit/junit-4.12.jar.md5", "log4j/log4j-1.2.jar"],
      )],
      Some(7),
      &[],
      &[],
    );
    ci
  }

  #[test]
  fn repository_artifact_is_appended() {
    let ci = with_repository(app_lib_base());
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(MANIFEST);
    fs::copy(fixture_path("app_dependencies.txt"), &path).unwrap();

    add_to_manifest(&ci.client(), &path, "junit", ProjectKind::Repository, &options()).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.ends_with("junit\n   Added by: app\n   Build: 7\n   SVN/GIT: 3rd-party     (rev: NA)\n\n"));

    let document = ManifestDocument::load(&path, REPOSITORY).unwrap();
    assert_eq!(document.entries.len(), 3);
    assert_eq!(document.find("junit").map(|p| p.kind), Some(ProjectKind::Repository));
  }

  #[test]
  fn unknown_artifact_leaves_manifest_alone() {
    let ci = with_repository(app_lib_base());
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(MANIFEST);
    fs::copy(fixture_path("app_dependencies.txt"), &path).unwrap();

    let err = add_to_manifest(&ci.client(), &path, "hamcrest", ProjectKind::Repository, &options()).unwrap_err();

    assert!(err.to_string().contains("hamcrest"));
    assert_eq!(fs::read_to_string(&path).unwrap(), fixture_content("app_dependencies.txt"));
  }
}
