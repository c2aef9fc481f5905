//! Implementation of the `depman download` command.

use std::path::Path;

use anyhow::{Context, Result};

use depman_lib::config::Settings;
use depman_lib::download::download_artifacts;
use depman_lib::manifest::ManifestDocument;

use super::local_manifest;
use crate::output::{print_info, print_success};

/// Download every artifact of the local manifest's builds matching `pattern` into `folder`.
pub fn cmd_download(settings: &Settings, folder: &Path, pattern: &str) -> Result<()> {
  let client = settings.client()?;
  let path = local_manifest(settings);
  let document = ManifestDocument::load(&path, &settings.repository_project)?;

  let written = download_artifacts(
    &client,
    &document,
    folder,
    pattern,
    &settings.manifest_filename,
    &settings.repository_project,
  )
  .with_context(|| format!("Failed to download artifacts listed in {}", path.display()))?;

  if written.is_empty() {
    print_info(&format!("No artifacts match '{}'", pattern));
  } else {
    print_success(&format!("Downloaded {} artifact(s) to {}", written.len(), folder.display()));
  }
  Ok(())
}
