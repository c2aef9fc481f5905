//! Per-user file locations: the config directory and the netrc file.

use crate::consts::{APP_NAME, CONFIG_FILENAME};
use std::path::PathBuf;

/// Returns the user's home directory, or an empty path when unset.
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE").map(PathBuf::from).unwrap_or_default()
}

/// Returns the user's home directory, or an empty path when unset.
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME").map(PathBuf::from).unwrap_or_default()
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
pub fn config_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for configuration files for the application
#[cfg(not(windows))]
pub fn config_dir() -> PathBuf {
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".config"));
  config_home.join(APP_NAME)
}

/// Default location of the settings file.
pub fn config_file() -> PathBuf {
  config_dir().join(CONFIG_FILENAME)
}

/// The user's netrc file, `_netrc` on Windows.
#[cfg(windows)]
pub fn netrc_file() -> PathBuf {
  home_dir().join("_netrc")
}

/// The user's netrc file, `_netrc` on Windows.
#[cfg(not(windows))]
pub fn netrc_file() -> PathBuf {
  home_dir().join(".netrc")
}
