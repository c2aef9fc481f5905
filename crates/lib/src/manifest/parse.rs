use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use super::render::CREATED_FORMAT;
use super::{ManifestDocument, ManifestEntry, ManifestProject};
use crate::project::{ProjectKind, ScmLocation};

static HEADER_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^###\s*(File created|Project|Build|SVN):\s*(.*?)\s*$").expect("Invalid header field regex")
});

static HEADER_CONTINUATION_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^###\s+(\S.*?)\s*$").expect("Invalid header continuation regex"));

// Revisions may contain spaces ("origin/main - 1a2b3c"), locations may not.
static REVISION_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^(?:(?:SVN/GIT|SVN):\s+)?(\S+)\s+\(rev: (.*)\)$").expect("Invalid revision line regex")
});

static ADDED_BY_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^Added by:\s*(.+)$").expect("Invalid added-by regex"));

static BUILD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Build:\s*(.+)$").expect("Invalid build regex"));

/// Errors parsing manifest text. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("line {line}: missing '### {field}:' header")]
  MissingHeader { field: &'static str, line: usize },

  #[error("line {line}: invalid build number '{value}'")]
  InvalidBuild { line: usize, value: String },

  #[error("line {line}: malformed revision line '{text}'")]
  MalformedRevision { line: usize, text: String },

  #[error("line {line}: entry '{entry}' is missing its '{expected}' line")]
  MalformedEntry {
    line: usize,
    entry: String,
    expected: &'static str,
  },

  #[error("line {line}: indented line outside of an entry")]
  OrphanLine { line: usize },
}

/// Lines of one entry: the name line and its indented continuation lines.
struct EntryLines<'a> {
  start: usize,
  name: &'a str,
  body: Vec<(usize, &'a str)>,
}

/// Parse manifest text.
///
/// An entry whose first revision location is `repository_project` is a repository artifact;
/// every other entry, and the master, is a CI project.
pub fn parse(text: &str, repository_project: &str) -> Result<ManifestDocument, ParseError> {
  let mut created = None;
  let mut master_name = None;
  let mut master_build = None;
  let mut master_scm = Vec::new();
  let mut in_header_scm = false;

  let mut entries: Vec<EntryLines<'_>> = Vec::new();
  let mut line_count = 0;

  for (index, raw) in text.lines().enumerate() {
    let line = index + 1;
    line_count = line;
    if raw.trim().is_empty() {
      continue;
    }

    if raw.starts_with('#') {
      if let Some(caps) = HEADER_FIELD_REGEX.captures(raw) {
        let value = &caps[2];
        in_header_scm = false;
        match &caps[1] {
          "File created" => {
            created = NaiveDateTime::parse_from_str(value, CREATED_FORMAT).ok();
            if created.is_none() {
              warn!(line, value, "ignoring unreadable creation time");
            }
          }
          "Project" => master_name = Some(value.to_string()),
          "Build" => master_build = Some(parse_build(value, line)?),
          _ => {
            master_scm.push(parse_revision(value, line)?);
            in_header_scm = true;
          }
        }
      } else if in_header_scm && let Some(caps) = HEADER_CONTINUATION_REGEX.captures(raw) {
        master_scm.push(parse_revision(&caps[1], line)?);
      }
      continue;
    }

    if raw.starts_with(char::is_whitespace) {
      let Some(entry) = entries.last_mut() else {
        return Err(ParseError::OrphanLine { line });
      };
      entry.body.push((line, raw.trim()));
    } else {
      entries.push(EntryLines {
        start: line,
        name: raw.trim(),
        body: Vec::new(),
      });
    }
  }

  let header_end = entries.first().map_or(line_count + 1, |e| e.start);
  let name = master_name.ok_or(ParseError::MissingHeader {
    field: "Project",
    line: header_end,
  })?;
  let build_number = master_build.ok_or(ParseError::MissingHeader {
    field: "Build",
    line: header_end,
  })?;

  let entries = entries
    .into_iter()
    .map(|lines| parse_entry(lines, repository_project))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(ManifestDocument {
    created,
    master: ManifestProject {
      name,
      build_number,
      scm: master_scm,
      kind: ProjectKind::Ci,
    },
    entries,
  })
}

fn parse_entry(lines: EntryLines<'_>, repository_project: &str) -> Result<ManifestEntry, ParseError> {
  let mut body = lines.body.into_iter();
  let missing = |expected| ParseError::MalformedEntry {
    line: lines.start,
    entry: lines.name.to_string(),
    expected,
  };

  let (_, added_by_line) = body.next().ok_or_else(|| missing("Added by"))?;
  let added_by = ADDED_BY_REGEX
    .captures(added_by_line)
    .map(|caps| caps[1].trim().to_string())
    .ok_or_else(|| missing("Added by"))?;

  let (build_line_number, build_line) = body.next().ok_or_else(|| missing("Build"))?;
  let build_number = match BUILD_REGEX.captures(build_line) {
    Some(caps) => parse_build(caps[1].trim(), build_line_number)?,
    None => return Err(missing("Build")),
  };

  let scm = body
    .map(|(line, text)| parse_revision(text, line))
    .collect::<Result<Vec<_>, _>>()?;

  let kind = match scm.first() {
    Some(first) if first.location == repository_project => ProjectKind::Repository,
    _ => ProjectKind::Ci,
  };

  Ok(ManifestEntry {
    project: ManifestProject {
      name: lines.name.to_string(),
      build_number,
      scm,
      kind,
    },
    added_by,
  })
}

fn parse_build(value: &str, line: usize) -> Result<Option<u64>, ParseError> {
  if value == "unknown" || value == "None" {
    return Ok(None);
  }
  value.parse().map(Some).map_err(|_| ParseError::InvalidBuild {
    line,
    value: value.to_string(),
  })
}

fn parse_revision(text: &str, line: usize) -> Result<ScmLocation, ParseError> {
  let text = text.trim();
  let caps = REVISION_REGEX.captures(text).ok_or_else(|| ParseError::MalformedRevision {
    line,
    text: text.to_string(),
  })?;
  Ok(ScmLocation::new(&caps[1], &caps[2]))
}
