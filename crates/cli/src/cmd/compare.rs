//! Implementation of the `depman compare` command.
//!
//! Prints, for each location a job uses in both manifests, whether its revision
//! changed, followed by the Subversion log (or diff) of the changes.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use depman_lib::compare::{compare_versions, svn_log};
use depman_lib::config::Settings;
use depman_lib::manifest::ManifestDocument;

use crate::output::symbols;

pub fn cmd_compare(settings: &Settings, old: &Path, new: &Path, job: &str, diff: bool) -> Result<()> {
  let old_document = ManifestDocument::load(old, &settings.repository_project)?;
  let new_document = ManifestDocument::load(new, &settings.repository_project)?;
  let comparison = compare_versions(&old_document, &new_document, job)?;

  println!(
    "Revision information for changes in job '{}' between build {} and build {}:",
    comparison.job, comparison.old_build, comparison.new_build
  );
  println!("Modules:");
  for change in &comparison.changes {
    if !change.is_changed() {
      println!("{}: revision {} same revision", change.path, change.new);
      continue;
    }

    println!("==========");
    println!(
      "{}: revision {} {} {}",
      change.path.if_supports_color(Stream::Stdout, |s| s.cyan()),
      change.old,
      symbols::ARROW,
      change.new.if_supports_color(Stream::Stdout, |s| s.green())
    );
    println!("----------");
    println!("Changes:");
    println!("{}", svn_log(change, diff)?);
  }
  Ok(())
}
