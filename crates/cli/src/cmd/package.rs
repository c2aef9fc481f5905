//! Implementation of the `depman package` command.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use depman_lib::config::Settings;
use depman_lib::package::{PackageRequest, package_view};

use super::local_manifest;
use crate::output::{print_stat, print_success};

/// Arguments of `depman package`.
pub struct PackageArgs {
  pub view: String,
  pub keyword: String,
  pub name: String,
  pub download: PathBuf,
  pub pattern: Option<String>,
  pub remove_md5s: bool,
  pub user: Option<String>,
}

pub fn cmd_package(settings: &Settings, args: PackageArgs) -> Result<()> {
  let view_user = args
    .user
    .or_else(|| settings.view_user.clone())
    .ok_or_else(|| anyhow!("No view owner given; pass --user or set view_user in the config file"))?;
  let client = settings.client()?;

  let request = PackageRequest {
    view_user,
    view: args.view,
    keyword: args.keyword,
    package_name: args.name,
    download_folder: args.download,
    extra_pattern: args.pattern,
    remove_md5s: args.remove_md5s,
    manifest_path: local_manifest(settings),
    repository_project: settings.repository_project.clone(),
  };
  let package = package_view(&client, &request)
    .with_context(|| format!("Failed to create package {}", request.package_name))?;

  print_success(&format!("Package created: {}", package.archive.display()));
  print_stat("Folder", &package.directory.display().to_string());
  print_stat("Checksum", &package.checksum.display().to_string());
  Ok(())
}
