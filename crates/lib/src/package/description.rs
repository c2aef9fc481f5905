//! Artifact declarations in job descriptions.
//!
//! Jobs taking part in a package declare which of their artifacts go into it in
//! their description, as `<keyword>:<symlink>=<pattern>:`. The same description
//! may hold declarations for several keywords.

use regex::RegexBuilder;
use roxmltree::Document;
use tracing::{debug, info};

use super::PackageError;
use crate::ci::CiBackend;

const DESCRIBED_ROOTS: [&str; 3] = ["project", "maven2-moduleset", "flow-definition"];

/// One `<symlink>=<pattern>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDeclaration {
  /// Name of the symlink to create in the package.
  pub symlink: String,
  /// Pattern selecting the artifact the symlink points at.
  pub pattern: String,
}

/// Declarations for `keyword` in the description of the job whose `config.xml` is given.
pub fn description_artifacts(
  job: &str,
  config_xml: &str,
  keyword: &str,
) -> Result<Vec<ArtifactDeclaration>, PackageError> {
  let doc = Document::parse(config_xml).map_err(|e| PackageError::Xml {
    job: job.to_string(),
    message: e.to_string(),
  })?;
  let root = doc.root_element();
  let tag = root.tag_name().name();
  if !DESCRIBED_ROOTS.contains(&tag) {
    return Err(PackageError::UnknownConfigType {
      job: job.to_string(),
      root: tag.to_string(),
    });
  }

  let description = root
    .children()
    .find(|n| n.is_element() && n.tag_name().name() == "description")
    .and_then(|n| n.text())
    .unwrap_or_default();

  let declaration = RegexBuilder::new(&format!("{}:(.*?):", regex::escape(keyword)))
    .dot_matches_new_line(true)
    .build()
    .map_err(|e| PackageError::Pattern {
      pattern: keyword.to_string(),
      source: e,
    })?;

  declaration
    .captures_iter(description)
    .map(|caps| {
      let text = &caps[1];
      let (symlink, pattern) = text.split_once('=').ok_or_else(|| PackageError::MalformedDeclaration {
        job: job.to_string(),
        declaration: text.to_string(),
      })?;
      Ok(ArtifactDeclaration {
        symlink: symlink.trim().to_string(),
        pattern: pattern.trim().to_string(),
      })
    })
    .collect()
}

/// Declarations for `keyword` across every job of a user's view, in view order.
pub fn view_artifacts(
  backend: &dyn CiBackend,
  user: &str,
  view: &str,
  keyword: &str,
) -> Result<Vec<ArtifactDeclaration>, PackageError> {
  info!(user, view, "identifying jobs");
  let jobs = backend.view_jobs(user, view)?;

  let mut declarations = Vec::new();
  for job in jobs {
    debug!(job = %job.name, "identifying artifacts");
    let config = backend.job_config(&job.name)?;
    declarations.extend(description_artifacts(&job.name, &config, keyword)?);
  }
  Ok(declarations)
}

/// Alternation of every declaration pattern plus an optional extra pattern.
pub fn combined_pattern(declarations: &[ArtifactDeclaration], extra: Option<&str>) -> String {
  declarations
    .iter()
    .map(|d| d.pattern.as_str())
    .chain(extra)
    .collect::<Vec<_>>()
    .join("|")
}
