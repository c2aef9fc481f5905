//! Gzip-compressed tar archives with an md5 sidecar.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;

use super::PackageError;
use crate::consts::MD5_SUFFIX;
use crate::util::hash::hash_file;

/// Result of [`create_package`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
  /// The renamed download folder.
  pub directory: PathBuf,
  /// `<package_name>.tgz`.
  pub archive: PathBuf,
  /// `<package_name>.tgz.md5`.
  pub checksum: PathBuf,
}

/// Copy `manifest_file` into `folder`, rename `folder` to `package_name` and archive it.
///
/// The archive and its checksum are written next to the renamed folder. The archive's
/// single top-level directory is `package_name`; symlinks are stored as links.
pub fn create_package(folder: &Path, package_name: &str, manifest_file: &Path) -> Result<Package, PackageError> {
  info!(folder = %folder.display(), package = package_name, "creating tar archive");
  let io_err = |path: &Path| {
    let path = path.to_path_buf();
    move |e| PackageError::Io { path, source: e }
  };

  let manifest_name = manifest_file
    .file_name()
    .ok_or_else(|| PackageError::Io {
      path: manifest_file.to_path_buf(),
      source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
    })?;
  fs::copy(manifest_file, folder.join(manifest_name)).map_err(io_err(manifest_file))?;

  let parent = folder.parent().unwrap_or_else(|| Path::new("."));
  let directory = parent.join(package_name);
  if directory != folder {
    fs::rename(folder, &directory).map_err(io_err(folder))?;
  }

  let archive = parent.join(format!("{}.tgz", package_name));
  let file = File::create(&archive).map_err(io_err(&archive))?;
  let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
  builder.follow_symlinks(false);
  builder
    .append_dir_all(package_name, &directory)
    .map_err(io_err(&archive))?;
  builder
    .into_inner()
    .and_then(|encoder| encoder.finish())
    .map_err(io_err(&archive))?;

  let checksum = parent.join(format!("{}.tgz{}", package_name, MD5_SUFFIX));
  let digest = hash_file(&archive).map_err(io_err(&archive))?;
  fs::write(&checksum, format!("{}  {}.tgz\n", digest, package_name)).map_err(io_err(&checksum))?;

  info!(archive = %archive.display(), "package created");
  Ok(Package {
    directory,
    archive,
    checksum,
  })
}
