//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("cannot create output file {path:?}: {source}")]
  OutputCreate {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed writing {path:?}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{path:?} already holds {} triangles, the STL maximum", u32::MAX)]
  TriangleLimit { path: PathBuf },

  #[error("slices must be at least 2x2 samples, got {dx}x{dy}")]
  InvalidDimensions { dx: usize, dy: usize },

  #[error("{stage} stage lost its peer")]
  Disconnected { stage: &'static str },

  #[error("{stage} stage panicked")]
  StagePanicked { stage: &'static str },

  #[error("failed to spawn {name} thread: {source}")]
  Spawn {
    name: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to build cell worker pool: {0}")]
  WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Failure to turn one file into a scalar slice. Never fatal: the layer
/// that needed the slice is skipped.
#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("cannot read {path:?}: {message}")]
  Unreadable { path: PathBuf, message: String },

  #[error("{path:?} uses an unsupported sample format ({format})")]
  UnsupportedFormat { path: PathBuf, format: String },

  #[error("{path:?} is {actual_dx}x{actual_dy}, expected {dx}x{dy}")]
  DimensionMismatch {
    path: PathBuf,
    dx: usize,
    dy: usize,
    actual_dx: usize,
    actual_dy: usize,
  },
}

/// Failures while locating and ordering the input slices.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("cannot scan {path:?}: {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("cannot read index {path:?}: {source}")]
  IndexRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed index {path:?}: {source}")]
  IndexParse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("no series matches study {study:?} / series {series:?}")]
  UnknownSelection {
    study: Option<String>,
    series: Option<String>,
  },

  #[error("no slices found in {0:?}")]
  NoSlices(PathBuf),

  #[error("none of the {0} slices could be decoded")]
  NoDecodableSlice(usize),
}
