mod add;
mod age;
mod build;
mod compare;
mod download;
mod package;

use std::path::PathBuf;

use depman_lib::config::Settings;
use depman_lib::project::SoftWarning;

use crate::output::print_warning;

pub use add::{cmd_add_artifact, cmd_add_project};
pub use age::{cmd_assert_dependency_age, cmd_assert_job_age};
pub use build::cmd_build;
pub use compare::cmd_compare;
pub use download::cmd_download;
pub use package::{PackageArgs, cmd_package};

/// The manifest in the working directory.
fn local_manifest(settings: &Settings) -> PathBuf {
  PathBuf::from(&settings.manifest_filename)
}

fn print_warnings<'a>(warnings: impl Iterator<Item = &'a SoftWarning>) {
  for warning in warnings {
    print_warning(&warning.to_string());
  }
}
