use super::ManifestDocument;
use crate::project::{BuildNumber, ScmLocation};

/// Timestamp format of the `### File created:` header.
pub(crate) const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADER_SCM_LABEL: &str = "### SVN: ";
const HEADER_SCM_CONTINUATION: &str = "###      ";
const ENTRY_SCM_LABEL: &str = "   SVN/GIT: ";
const ENTRY_SCM_CONTINUATION: &str = "        ";

/// Render a document as manifest text.
///
/// Output depends only on the document, so equal documents render identically.
pub fn render(document: &ManifestDocument) -> String {
  let mut out = String::new();

  if let Some(created) = document.created {
    out.push_str(&format!("### File created: {}\n", created.format(CREATED_FORMAT)));
  }
  out.push_str(&format!("### Project: {}\n", document.master.name));
  out.push_str(&format!("### Build: {}\n", BuildNumber(document.master.build_number)));
  write_locations(&mut out, &document.master.scm, HEADER_SCM_LABEL, HEADER_SCM_CONTINUATION);
  out.push('\n');

  for entry in &document.entries {
    out.push_str(&format!("{}\n", entry.project.name));
    out.push_str(&format!("   Added by: {}\n", entry.added_by));
    out.push_str(&format!("   Build: {}\n", BuildNumber(entry.project.build_number)));
    write_locations(&mut out, &entry.project.scm, ENTRY_SCM_LABEL, ENTRY_SCM_CONTINUATION);
    out.push('\n');
  }

  out
}

/// Locations are right-padded to the widest one in the list.
fn write_locations(out: &mut String, locations: &[ScmLocation], label: &str, continuation: &str) {
  let width = locations.iter().map(|l| l.location.chars().count()).max().unwrap_or(0);
  for (i, scm) in locations.iter().enumerate() {
    let prefix = if i == 0 { label } else { continuation };
    out.push_str(&format!(
      "{}{:<width$}     (rev: {})\n",
      prefix,
      scm.location,
      scm.revision,
      width = width
    ));
  }
}
