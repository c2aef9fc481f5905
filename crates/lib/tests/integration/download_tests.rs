//! Downloading and packaging against a mock CI server.

use std::fs;

use depman_lib::download::{ALL_ARTIFACTS, download_artifacts};
use depman_lib::manifest::ManifestDocument;
use depman_lib::package::{PackageError, PackageRequest, package_view};
use depman_lib::util::hash::hash_bytes;
use tempfile::TempDir;

use super::common::*;

fn app_manifest() -> ManifestDocument {
  ManifestDocument::load(&fixture_path("app_dependencies.txt"), REPOSITORY).unwrap()
}

mod download {
  use super::*;

  #[test]
  fn fetches_every_listed_artifact_but_the_manifest() {
    let ci = app_lib_base();
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("dist");

    let written = download_artifacts(&ci.client(), &app_manifest(), &target, ALL_ARTIFACTS, MANIFEST, REPOSITORY).unwrap();

    assert_eq!(written, vec![target.join("app.war"), target.join("lib.jar")]);
    assert_eq!(fs::read_to_string(target.join("lib.jar")).unwrap(), "lib-bytes");
    assert!(!target.join(MANIFEST).exists());
  }

  #[test]
  fn pattern_selects_artifacts() {
    let ci = app_lib_base();
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("dist");

    let written = download_artifacts(&ci.client(), &app_manifest(), &target, "lib", MANIFEST, REPOSITORY).unwrap();
    assert_eq!(written, vec![target.join("lib.jar")]);
  }
}

mod package {
  use super::*;

  const WEB_CONFIG: &str = r"<?xml version='1.1' encoding='UTF-8'?>
<project>
  <description>Web front end.
release:web.war=web-[0-9.]+\.war:</description>
  <scm class='hudson.scm.NullSCM'/>
</project>";

  fn web_server(checksum: &str) -> CiServer {
    let files = ["web-1.4.war", "web-1.4.war.md5"];
    let mut ci = CiServer::new();
    ci.job_with_config("web", vec![build(2, &[], &files)], Some(2), &[], WEB_CONFIG);
    ci.view("builder", "release", &["web"]);
    ci.artifact("web", 2, "web-1.4.war", "war-bytes");
    ci.artifact("web", 2, "web-1.4.war.md5", &format!("{}  web-1.4.war\n", checksum));
    ci
  }

  fn request(temp: &TempDir) -> PackageRequest {
    let manifest_path = temp.path().join(MANIFEST);
    fs::write(&manifest_path, "### Project: web\n### Build: 2\n\n").unwrap();
    PackageRequest {
      view_user: "builder".into(),
      view: "release".into(),
      keyword: "release".into(),
      package_name: "web-1.4".into(),
      download_folder: temp.path().join("download"),
      extra_pattern: None,
      remove_md5s: true,
      manifest_path,
      repository_project: REPOSITORY.into(),
    }
  }

  #[test]
  fn view_is_packaged() {
    let ci = web_server(&hash_bytes(b"war-bytes").to_string());
    let temp = TempDir::new().unwrap();

    let package = package_view(&ci.client(), &request(&temp)).unwrap();

    assert_eq!(package.archive, temp.path().join("web-1.4.tgz"));
    assert_eq!(fs::read_to_string(package.directory.join("web.war")).unwrap(), "war-bytes");
    assert!(package.directory.join(MANIFEST).exists());
    assert!(!package.directory.join("web-1.4.war.md5").exists());
    assert!(package.checksum.exists());
  }

  #[test]
  fn corrupt_download_is_rejected() {
    let ci = web_server("00000000000000000000000000000000");
    let temp = TempDir::new().unwrap();

    let result = package_view(&ci.client(), &request(&temp));
    assert!(matches!(result, Err(PackageError::ChecksumMismatch { .. })));
    assert!(!temp.path().join("web-1.4.tgz").exists());
  }
}
