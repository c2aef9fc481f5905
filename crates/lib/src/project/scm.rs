//! Revision-control locations of a CI project.
//!
//! Locations come from the project's `config.xml`; which element path holds them
//! depends on the configuration's root element. Revisions come from the resolved
//! build: Subversion builds list a revision per module location, git builds carry
//! either pipeline change sets or the git plugin's build data.

use roxmltree::{Document, Node};
use tracing::warn;

use super::{ScmLocation, SoftWarning};
use crate::ci::{BuildInfo, CiError};

const SVN_LOCATION_PATH: &[&str] = &["scm", "locations", "hudson.scm.SubversionSCM_-ModuleLocation", "remote"];

const GIT_MAVEN_PATH: &[&str] = &["scm", "userRemoteConfigs", "hudson.plugins.git.UserRemoteConfig", "url"];

const GIT_PIPELINE_PATH: &[&str] = &[
  "properties",
  "org.jenkinsci.plugins.workflow.multibranch.BranchJobProperty",
  "branch",
  "scm",
  "userRemoteConfigs",
  "hudson.plugins.git.UserRemoteConfig",
  "url",
];

/// Recognized configuration root elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigType {
  /// Freestyle job (`<project>`).
  Freestyle,
  /// Maven job (`<maven2-moduleset>`).
  Maven,
  /// Pipeline job (`<flow-definition>`).
  Pipeline,
}

impl ConfigType {
  pub fn from_root(tag: &str) -> Option<Self> {
    match tag {
      "project" => Some(Self::Freestyle),
      "maven2-moduleset" => Some(Self::Maven),
      "flow-definition" => Some(Self::Pipeline),
      _ => None,
    }
  }

  fn svn_path(self) -> Option<&'static [&'static str]> {
    match self {
      Self::Freestyle | Self::Maven => Some(SVN_LOCATION_PATH),
      Self::Pipeline => None,
    }
  }

  fn git_path(self) -> Option<&'static [&'static str]> {
    match self {
      Self::Maven => Some(GIT_MAVEN_PATH),
      Self::Pipeline => Some(GIT_PIPELINE_PATH),
      Self::Freestyle => None,
    }
  }
}

/// Result of reading a project's revision-control information.
#[derive(Debug, Default)]
pub struct ScmExtraction {
  /// `None` if no location could be found at all.
  pub locations: Option<Vec<ScmLocation>>,
  pub warnings: Vec<SoftWarning>,
}

/// Read revision-control locations from `config_xml` and pair them with revisions from `build`.
///
/// Subversion is tried first; git only when no Subversion location exists.
pub fn extract(project: &str, config_xml: &str, build: Option<&BuildInfo>) -> Result<ScmExtraction, CiError> {
  let doc = Document::parse(config_xml).map_err(|e| CiError::Xml {
    job: project.to_string(),
    message: e.to_string(),
  })?;
  let root = doc.root_element();
  let root_tag = root.tag_name().name();

  let Some(config_type) = ConfigType::from_root(root_tag) else {
    warn!(project, root = root_tag, "unknown configuration type, no revision information");
    return Ok(ScmExtraction {
      locations: None,
      warnings: vec![SoftWarning::UnknownConfigType {
        project: project.to_string(),
        root: root_tag.to_string(),
      }],
    });
  };

  let mut extraction = ScmExtraction::default();

  let svn_locations = config_type.svn_path().map(|p| select_text(root, p)).unwrap_or_default();
  if !svn_locations.is_empty() {
    let found = svn_locations
      .into_iter()
      .filter_map(|location| match svn_revision(build, &location) {
        Some(revision) => Some(ScmLocation::new(location, revision)),
        None => {
          extraction.warnings.push(missing_revision(project, &location, build));
          None
        }
      })
      .collect();
    extraction.locations = Some(found);
    return Ok(extraction);
  }

  let git_locations = config_type.git_path().map(|p| select_text(root, p)).unwrap_or_default();
  if !git_locations.is_empty() {
    let found = git_locations
      .into_iter()
      .filter_map(|location| match git_revision(build) {
        Some(revision) => Some(ScmLocation::new(location, revision)),
        None => {
          extraction.warnings.push(missing_revision(project, &location, build));
          None
        }
      })
      .collect();
    extraction.locations = Some(found);
    return Ok(extraction);
  }

  warn!(project, "could not find revision-control location");
  extraction.warnings.push(SoftWarning::NoScmLocation {
    project: project.to_string(),
  });
  Ok(extraction)
}

fn missing_revision(project: &str, location: &str, build: Option<&BuildInfo>) -> SoftWarning {
  let build = build.map(|b| b.number);
  warn!(project, location, ?build, "could not find revision for location");
  SoftWarning::MissingRevision {
    project: project.to_string(),
    location: location.to_string(),
    build,
  }
}

fn svn_revision(build: Option<&BuildInfo>, location: &str) -> Option<String> {
  build?
    .change_set
    .as_ref()?
    .revisions
    .iter()
    .find(|r| r.module == location)
    .map(|r| r.revision.clone())
}

fn git_revision(build: Option<&BuildInfo>) -> Option<String> {
  let build = build?;

  if let Some(change_sets) = &build.change_sets {
    return change_sets
      .iter()
      .find(|set| set.kind.as_deref() == Some("git"))
      .and_then(|set| set.items.first())
      .and_then(|item| item.commit_id.clone());
  }

  if build.change_set.is_some() {
    let data = build.git_build_data()?;
    let branch = data.branch.first().map(|b| b.name.as_str()).unwrap_or_default();
    return Some(format!("{} - {}", branch, data.sha1));
  }

  None
}

/// Text of every element reached by following `path` from `node`, in document order.
fn select_text(node: Node<'_, '_>, path: &[&str]) -> Vec<String> {
  let Some((first, rest)) = path.split_first() else {
    return node.text().map(|t| vec![t.trim().to_string()]).unwrap_or_default();
  };

  node
    .children()
    .filter(|child| child.is_element() && child.tag_name().name() == *first)
    .flat_map(|child| select_text(child, rest))
    .collect()
}
