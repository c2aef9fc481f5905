//! Implementation of the `depman assert-job-age` and `depman assert-dependency-age` commands.

use std::time::Duration;

use anyhow::Result;

use depman_lib::age::{assert_dependency_age, assert_job_age};
use depman_lib::config::Settings;

use crate::output::{format_age, print_success};

fn hours(hours: u64) -> Duration {
  Duration::from_secs(hours * 3600)
}

pub fn cmd_assert_job_age(settings: &Settings, job: &str, max_hours: u64) -> Result<()> {
  let client = settings.client()?;
  let age = assert_job_age(&client, job, hours(max_hours))?;
  print_success(&format!(
    "Last stable build of {} is {} old, within {} hours",
    job,
    format_age(age),
    max_hours
  ));
  Ok(())
}

pub fn cmd_assert_dependency_age(
  settings: &Settings,
  master: &str,
  build: u64,
  dependency: &str,
  max_hours: u64,
) -> Result<()> {
  let client = settings.client()?;
  let age = assert_dependency_age(
    &client,
    master,
    build,
    dependency,
    hours(max_hours),
    &settings.graph_options(),
  )?;
  print_success(&format!(
    "{} used by {}-{} is {} old, within {} hours",
    dependency,
    master,
    build,
    format_age(age),
    max_hours
  ));
  Ok(())
}
