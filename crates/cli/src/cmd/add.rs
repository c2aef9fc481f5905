//! Implementation of the `depman add-project` and `depman add-artifact` commands.

use anyhow::{Context, Result};

use depman_lib::config::Settings;
use depman_lib::manage::add_to_manifest;
use depman_lib::project::ProjectKind;

use super::{local_manifest, print_warnings};
use crate::output::print_success;

pub fn cmd_add_project(settings: &Settings, name: &str) -> Result<()> {
  add(settings, name, ProjectKind::Ci)
}

pub fn cmd_add_artifact(settings: &Settings, name: &str) -> Result<()> {
  add(settings, name, ProjectKind::Repository)
}

fn add(settings: &Settings, name: &str, kind: ProjectKind) -> Result<()> {
  let client = settings.client()?;
  let path = local_manifest(settings);

  let set = add_to_manifest(&client, &path, name, kind, &settings.graph_options())
    .with_context(|| format!("Failed to add '{}' to {}", name, path.display()))?;

  print_warnings(set.warnings());
  match set.get(name) {
    Some(project) => print_success(&format!("{} listed in {}", project, path.display())),
    None => print_success(&format!("Updated {}", path.display())),
  }
  Ok(())
}
