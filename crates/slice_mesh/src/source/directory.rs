//! Flat directory scan.

use std::path::Path;

use walkdir::WalkDir;

use super::SourceEntry;
use crate::error::SourceError;

/// Files directly inside `dir` whose extension matches `extension`
/// (case-insensitive), ordered by file name.
pub fn scan_directory(dir: &Path, extension: &str) -> Result<Vec<SourceEntry>, SourceError> {
  let extension = extension.trim_start_matches('.');
  let mut entries = Vec::new();

  for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|source| SourceError::Walk {
      path: dir.to_path_buf(),
      source,
    })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let matches = entry
      .path()
      .extension()
      .and_then(|e| e.to_str())
      .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if matches {
      entries.push(SourceEntry::file(entry.into_path()));
    }
  }

  Ok(entries)
}

#[cfg(test)]
#[path = "directory_test.rs"]
mod directory_test;
