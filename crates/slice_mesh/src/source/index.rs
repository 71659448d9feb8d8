//! Structured index manifest.
//!
//! ```toml
//! [[patient]]
//! name = "anonymous"
//!
//! [[patient.study]]
//! id = "1.2.840.1"
//!
//! [[patient.study.series]]
//! id = "1.2.840.1.7"
//! pixel_spacing = [0.5, 0.5]        # (column, row), optional
//!
//! [[patient.study.series.slice]]
//! file = "series7/0001.png"         # relative to the manifest's directory
//! position = [0.0, 0.0, -120.5]     # optional
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::SourceEntry;
use crate::error::SourceError;
use crate::geometry::Vec3;

#[derive(Debug, Default, Deserialize)]
pub struct IndexManifest {
  #[serde(default, rename = "patient")]
  pub patients: Vec<PatientRecord>,
}

#[derive(Debug, Deserialize)]
pub struct PatientRecord {
  #[serde(default)]
  pub name: String,
  #[serde(default, rename = "study")]
  pub studies: Vec<StudyRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StudyRecord {
  pub id: String,
  #[serde(default)]
  pub series: Vec<SeriesRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SeriesRecord {
  pub id: String,
  pub pixel_spacing: Option<[f32; 2]>,
  #[serde(default, rename = "slice")]
  pub slices: Vec<SliceRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SliceRecord {
  pub file: PathBuf,
  pub position: Option<[f32; 3]>,
}

/// Optional (study, series) filter. Unset fields match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
  pub study: Option<String>,
  pub series: Option<String>,
}

impl Selection {
  pub fn new(study: Option<String>, series: Option<String>) -> Self {
    Self { study, series }
  }

  pub fn is_empty(&self) -> bool {
    self.study.is_none() && self.series.is_none()
  }

  fn matches(&self, study: &str, series: &str) -> bool {
    self.study.as_deref().map_or(true, |s| s == study)
      && self.series.as_deref().map_or(true, |s| s == series)
  }
}

/// One selectable series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesInfo {
  pub patient: String,
  pub study: String,
  pub series: String,
  pub slices: usize,
}

impl IndexManifest {
  pub fn load(path: &Path) -> Result<Self, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::IndexRead {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&text, path)
  }

  pub fn parse(text: &str, path: &Path) -> Result<Self, SourceError> {
    toml::from_str(text).map_err(|source| SourceError::IndexParse {
      path: path.to_path_buf(),
      source,
    })
  }

  fn series(&self) -> impl Iterator<Item = (&PatientRecord, &StudyRecord, &SeriesRecord)> {
    self.patients.iter().flat_map(|patient| {
      patient.studies.iter().flat_map(move |study| {
        study.series.iter().map(move |series| (patient, study, series))
      })
    })
  }

  /// Slice files of every selected series, in manifest order.
  ///
  /// Relative paths are resolved against the directory holding `manifest_path`.
  pub fn entries(
    &self,
    manifest_path: &Path,
    selection: &Selection,
  ) -> Result<Vec<SourceEntry>, SourceError> {
    let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    let mut matched = false;
    let mut entries = Vec::new();

    for (_, study, series) in self.series() {
      if !selection.matches(&study.id, &series.id) {
        continue;
      }
      matched = true;
      let pixel_spacing = series.pixel_spacing.map(|[col, row]| (col, row));
      entries.extend(series.slices.iter().map(|slice| SourceEntry {
        file: base.join(&slice.file),
        position: slice.position.map(Vec3::from_array),
        pixel_spacing,
      }));
    }

    if !matched && !selection.is_empty() {
      return Err(SourceError::UnknownSelection {
        study: selection.study.clone(),
        series: selection.series.clone(),
      });
    }
    Ok(entries)
  }
}

/// Every (patient, study, series) the manifest at `path` describes.
pub fn list_series(path: &Path) -> Result<Vec<SeriesInfo>, SourceError> {
  let manifest = IndexManifest::load(path)?;
  Ok(
    manifest
      .series()
      .map(|(patient, study, series)| SeriesInfo {
        patient: patient.name.clone(),
        study: study.id.clone(),
        series: series.id.clone(),
        slices: series.slices.len(),
      })
      .collect(),
  )
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
