//! Operations on the download folder before it is archived.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::PackageError;
use super::description::ArtifactDeclaration;
use crate::consts::MD5_SUFFIX;
use crate::download::anchored_pattern;
use crate::util::hash::{hash_file, parse_checksum_line};

/// File names in `folder`, sorted.
fn file_names(folder: &Path) -> Result<Vec<String>, PackageError> {
  let io_err = |e| PackageError::Io {
    path: folder.to_path_buf(),
    source: e,
  };
  let mut names = Vec::new();
  for entry in fs::read_dir(folder).map_err(io_err)? {
    names.push(entry.map_err(io_err)?.file_name().to_string_lossy().into_owned());
  }
  names.sort();
  Ok(names)
}

/// Check that every file in `folder` has a `<file>.md5` sibling holding its digest.
pub fn check_md5_sums(folder: &Path) -> Result<(), PackageError> {
  info!(folder = %folder.display(), "checking md5 sums");

  for name in file_names(folder)? {
    if name.ends_with(MD5_SUFFIX) {
      continue;
    }
    let file = folder.join(&name);
    let checksum_file = folder.join(format!("{}{}", name, MD5_SUFFIX));
    if !checksum_file.exists() {
      return Err(PackageError::MissingChecksum { file });
    }

    let content = fs::read_to_string(&checksum_file).map_err(|e| PackageError::Io {
      path: checksum_file.clone(),
      source: e,
    })?;
    let expected = parse_checksum_line(&content).unwrap_or_default().to_lowercase();
    let actual = hash_file(&file)
      .map_err(|e| PackageError::Io {
        path: file.clone(),
        source: e,
      })?
      .0;

    if actual != expected {
      return Err(PackageError::ChecksumMismatch { file, expected, actual });
    }
    debug!(file = %name, "md5 sum verified");
  }
  Ok(())
}

/// For each declaration, link `symlink` to the single non-checksum file matching its pattern.
///
/// A pattern matching no file is skipped. Links are relative to `folder`.
pub fn create_symlinks(folder: &Path, declarations: &[ArtifactDeclaration]) -> Result<Vec<PathBuf>, PackageError> {
  let files: Vec<String> = file_names(folder)?
    .into_iter()
    .filter(|name| !name.ends_with(MD5_SUFFIX))
    .collect();

  let mut links = Vec::new();
  for declaration in declarations {
    let matcher = anchored_pattern(&declaration.pattern)?;
    let matches: Vec<&String> = files
      .iter()
      .filter(|name| **name != declaration.symlink && matcher.is_match(name))
      .collect();

    match matches.as_slice() {
      [] => debug!(pattern = %declaration.pattern, "no file matches, skipping symlink"),
      [target] => {
        let link = folder.join(&declaration.symlink);
        debug!(link = %link.display(), target = %target, "creating symlink");
        symlink_file(Path::new(target.as_str()), &link).map_err(|e| PackageError::Io {
          path: link.clone(),
          source: e,
        })?;
        links.push(link);
      }
      _ => {
        return Err(PackageError::AmbiguousPattern {
          pattern: declaration.pattern.clone(),
          matches: matches.iter().map(|m| m.to_string()).collect(),
        });
      }
    }
  }
  Ok(links)
}

/// Delete every `.md5` file in `folder`, returning how many were removed.
pub fn remove_md5_files(folder: &Path) -> Result<usize, PackageError> {
  let mut removed = 0;
  for name in file_names(folder)? {
    if name.ends_with(MD5_SUFFIX) {
      let path = folder.join(&name);
      fs::remove_file(&path).map_err(|e| PackageError::Io { path, source: e })?;
      removed += 1;
    }
  }
  debug!(removed, "removed md5 files");
  Ok(removed)
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> std::io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> std::io::Result<()> {
  std::os::windows::fs::symlink_file(target, link)
}
