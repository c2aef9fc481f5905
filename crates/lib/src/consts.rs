//! Application-wide constants.

/// Application name, used for config directories.
pub const APP_NAME: &str = "depman";

/// Default name of the manifest file written next to a build and archived as an artifact.
pub const DEFAULT_MANIFEST_FILENAME: &str = "dependencies.txt";

/// Default name of the CI job that archives third-party artifacts.
pub const DEFAULT_REPOSITORY_PROJECT: &str = "3rd-party-dependencies";

/// Default CI server URL.
pub const DEFAULT_SERVER: &str = "http://localhost:8080/";

/// Environment variable holding `user:password` credentials for the CI server.
pub const CREDENTIALS_ENV: &str = "JENKINS_CREDENTIALS";

/// Config file name inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Suffix of checksum sidecar files.
pub const MD5_SUFFIX: &str = ".md5";

/// Revision recorded for repository artifacts, which have no SCM of their own.
pub const REPOSITORY_REVISION: &str = "NA";

/// API depth used when querying projects; depth 1 includes full build details.
pub const JOB_INFO_DEPTH: u32 = 1;
