//! Locating and ordering input slices.
//!
//! Two kinds of input are understood:
//!
//! - a directory, scanned (non-recursively) for files with one extension
//! - a TOML index manifest describing a patient → study → series → slice
//!   hierarchy, optionally narrowed to one (study, series)
//!
//! Either way the result is a list of [`SourceEntry`] values that
//! [`resolve_volume`] turns into an ordered [`VolumeGeometry`].

use std::path::{Path, PathBuf};

use crate::decode::MetadataReader;
use crate::error::SourceError;
use crate::geometry::Vec3;

pub mod directory;
pub mod geometry;
pub mod index;

pub use directory::scan_directory;
pub use geometry::{order_slices, resolve_volume, VolumeGeometry};
pub use index::{list_series, IndexManifest, Selection, SeriesInfo};

/// One slice file and the position of its first sample.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceDescriptor {
  pub file: PathBuf,
  pub position: Vec3,
}

impl SliceDescriptor {
  pub fn new(file: impl Into<PathBuf>, position: Vec3) -> Self {
    Self {
      file: file.into(),
      position,
    }
  }
}

/// A file named by a source, with whatever geometry the source itself knows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceEntry {
  pub file: PathBuf,
  pub position: Option<Vec3>,
  /// `(column, row)` spacing of the enclosing series.
  pub pixel_spacing: Option<(f32, f32)>,
}

impl SourceEntry {
  pub fn file(file: impl Into<PathBuf>) -> Self {
    Self {
      file: file.into(),
      ..Default::default()
    }
  }
}

/// Where slices come from.
#[derive(Clone, Debug, PartialEq)]
pub enum SliceSource {
  Directory { dir: PathBuf, extension: String },
  Index { manifest: PathBuf, selection: Selection },
}

impl SliceSource {
  /// A `.toml` file is an index manifest; anything else is scanned as a
  /// directory.
  pub fn detect(input: &Path, extension: &str, selection: Selection) -> Self {
    let is_manifest = input.is_file()
      && input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

    if is_manifest {
      Self::Index {
        manifest: input.to_path_buf(),
        selection,
      }
    } else {
      Self::Directory {
        dir: input.to_path_buf(),
        extension: extension.to_string(),
      }
    }
  }

  /// Enumerate the slice files, in source order.
  pub fn entries(&self) -> Result<Vec<SourceEntry>, SourceError> {
    match self {
      Self::Directory { dir, extension } => scan_directory(dir, extension),
      Self::Index {
        manifest,
        selection,
      } => IndexManifest::load(manifest)?.entries(manifest, selection),
    }
  }

  /// Enumerate, read metadata and order the slices.
  pub fn resolve<M>(&self, reader: &M) -> Result<VolumeGeometry, SourceError>
  where
    M: MetadataReader + ?Sized,
  {
    let entries = self.entries()?;
    if entries.is_empty() {
      return Err(SourceError::NoSlices(self.location().to_path_buf()));
    }
    resolve_volume(&entries, reader)
  }

  pub fn location(&self) -> &Path {
    match self {
      Self::Directory { dir, .. } => dir,
      Self::Index { manifest, .. } => manifest,
    }
  }
}
