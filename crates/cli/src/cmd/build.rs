//! Implementation of the `depman build` command.

use anyhow::{Context, Result};

use depman_lib::config::Settings;
use depman_lib::manage::build_manifest;

use super::{local_manifest, print_warnings};
use crate::output::{print_stat, print_success};

/// Write the manifest of `job` at `build` to the working directory.
///
/// A dependency conflict aborts the build on the CI server and fails the command.
pub fn cmd_build(settings: &Settings, job: &str, build: u64) -> Result<()> {
  let client = settings.client()?;
  let path = local_manifest(settings);

  let set = build_manifest(&client, job, build, &path, &settings.graph_options())
    .with_context(|| format!("Failed to create dependency file for {}-{}", job, build))?;

  print_warnings(set.warnings());
  print_success(&format!("Dependency file created: {}", path.display()));
  print_stat("Project", &set.master().to_string());
  print_stat("Dependencies", &set.entries().len().to_string());
  Ok(())
}
