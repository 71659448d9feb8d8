//! Types shared by the pipeline stages.

use std::time::Duration;

use crate::grid_cell::{Sample, ScalarSlice};
use crate::stl::StlFormat;

/// Two adjacent slices: `top` is the earlier one.
///
/// One pool slot on the reader → builder link.
#[derive(Clone, Debug, Default)]
pub struct SlicePair {
  pub top: ScalarSlice,
  pub bottom: ScalarSlice,
}

impl SlicePair {
  pub fn new(dx: usize, dy: usize) -> Self {
    Self {
      top: ScalarSlice::new(dx, dy),
      bottom: ScalarSlice::new(dx, dy),
    }
  }
}

/// Per-run configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
  /// Samples strictly below this value are inside the surface.
  pub isolevel: Sample,
  pub format: StlFormat,
  /// Width of the cell-building pool; `None` uses every CPU.
  pub cell_threads: Option<usize>,
}

impl Default for PipelineSettings {
  fn default() -> Self {
    Self {
      isolevel: 0,
      format: StlFormat::Text,
      cell_threads: None,
    }
  }
}

/// Outcome of one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PipelineReport {
  /// Layers built and triangulated.
  pub layers_built: usize,
  /// Slice pairs dropped because a file failed to decode.
  pub layers_skipped: usize,
  pub triangles: u32,
  /// The run stopped early on request. The mesh is still complete and valid.
  pub cancelled: bool,
  pub elapsed: Duration,
}
