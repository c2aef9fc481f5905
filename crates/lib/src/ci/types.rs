//! Records decoded from the CI server's JSON API.
//!
//! Only the fields the dependency tracker reads are declared. Everything else the
//! server sends is ignored, and missing optional fields fall back to their defaults,
//! so newer or older server versions decode without errors.

use serde::{Deserialize, Deserializer};

/// Project-level information, as returned by `job/<name>/api/json?depth=1`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobInfo {
  pub name: String,
  pub url: String,
  /// Known builds, newest first. With `depth >= 1` each entry carries full build details.
  pub builds: Vec<BuildInfo>,
  pub last_stable_build: Option<BuildRef>,
  pub last_successful_build: Option<BuildRef>,
  /// Upstream projects configured at project level.
  pub upstream_projects: Vec<ProjectLink>,
}

impl JobInfo {
  /// Find a build by number.
  pub fn build(&self, number: u64) -> Option<&BuildInfo> {
    self.builds.iter().find(|b| b.number == number)
  }

  /// All known build numbers in ascending order.
  pub fn build_numbers(&self) -> Vec<u64> {
    let mut numbers: Vec<u64> = self.builds.iter().map(|b| b.number).collect();
    numbers.sort_unstable();
    numbers
  }
}

/// Pointer to a build (`lastStableBuild`, `lastSuccessfulBuild`, ...).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildRef {
  pub number: u64,
  pub url: String,
}

/// A named link to another project.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectLink {
  pub name: String,
  pub url: String,
}

/// Details of a single build.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildInfo {
  pub number: u64,
  /// Build start, epoch milliseconds.
  pub timestamp: i64,
  pub result: Option<String>,
  pub artifacts: Vec<ArtifactInfo>,
  pub actions: Vec<BuildAction>,
  /// Freestyle and maven jobs report a single change set.
  pub change_set: Option<ChangeSet>,
  /// Pipeline jobs report one change set per SCM.
  pub change_sets: Option<Vec<ChangeSet>>,
}

impl BuildInfo {
  /// Names of the upstream projects recorded as causes of this build.
  ///
  /// Folder-qualified names (`folder/job`) are mapped to their URL form (`folder/job/job`).
  pub fn upstream_causes(&self) -> Vec<String> {
    self
      .actions
      .iter()
      .flat_map(|action| action.causes.iter())
      .filter_map(|cause| cause.upstream_project.as_deref())
      .map(|name| name.replace('/', "/job/"))
      .collect()
  }

  /// The git data recorded by the git plugin, if any.
  pub fn git_build_data(&self) -> Option<&GitRevision> {
    self
      .actions
      .iter()
      .filter(|a| a.class.as_deref() == Some(GIT_BUILD_DATA_CLASS))
      .find_map(|a| a.last_built_revision.as_ref())
  }
}

/// `_class` of the action the git plugin attaches to each build.
pub const GIT_BUILD_DATA_CLASS: &str = "hudson.plugins.git.util.BuildData";

/// An archived build artifact.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtifactInfo {
  pub file_name: String,
  pub relative_path: String,
}

/// One entry of a build's `actions` list. Most actions are irrelevant and decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildAction {
  #[serde(rename = "_class")]
  pub class: Option<String>,
  pub causes: Vec<BuildCause>,
  pub last_built_revision: Option<GitRevision>,
}

/// Why a build was started.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildCause {
  pub short_description: Option<String>,
  pub upstream_project: Option<String>,
  pub upstream_build: Option<u64>,
}

/// A change set reported for a build.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChangeSet {
  pub kind: Option<String>,
  pub items: Vec<ChangeSetItem>,
  /// Subversion only: the revision checked out per module location.
  pub revisions: Vec<SvnRevision>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeSetItem {
  pub commit_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SvnRevision {
  pub module: String,
  #[serde(deserialize_with = "string_or_number")]
  pub revision: String,
}

/// `lastBuiltRevision` of the git plugin's build data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GitRevision {
  #[serde(rename = "SHA1")]
  pub sha1: String,
  pub branch: Vec<GitBranch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GitBranch {
  pub name: String,
  #[serde(rename = "SHA1")]
  pub sha1: String,
}

/// A user view, as returned by `user/<user>/my-views/view/<view>/api/json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewInfo {
  pub name: String,
  pub jobs: Vec<ProjectLink>,
}

/// Subversion revisions are numbers, everything else is a string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(match value {
    serde_json::Value::String(s) => s,
    serde_json::Value::Null => String::new(),
    other => other.to_string(),
  })
}
