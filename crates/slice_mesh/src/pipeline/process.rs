//! Pipeline orchestrator.
//!
//! Wires the three stages together over two pooled links and runs each on
//! its own named thread:
//!
//! ```text
//!  slice-reader ──(slice pairs, 2 buffers)──► cell-builder ──(cell layers, 2 buffers)──► triangulator ──► STL
//!                                               │
//!                                        rayon pool (cells)
//! ```
//!
//! While layer `n` is being triangulated, layer `n + 1` can be built and
//! pair `n + 2` read. Memory in flight is fixed by the pool depth, whatever
//! the number of slices.

use std::path::Path;
use std::thread;

use web_time::Instant;

use super::builder::run_builder;
use super::reader::run_reader;
use super::triangulator::run_triangulator;
use super::types::{PipelineReport, PipelineSettings, SlicePair};
use crate::cancel::CancelSignal;
use crate::constants::POOL_DEPTH;
use crate::decode::SliceDecoder;
use crate::error::PipelineError;
use crate::grid_cell::{CellLayer, LayerLayout};
use crate::log_sink::LogHandle;
use crate::pool;
use crate::source::VolumeGeometry;
use crate::stl::StlWriter;
use crate::threading::{cell_pool, join_stage, spawn_stage};

/// Reject volumes too small to hold a single cell.
pub fn validate_layout(layout: &LayerLayout) -> Result<(), PipelineError> {
  if layout.dx < 2 || layout.dy < 2 {
    return Err(PipelineError::InvalidDimensions {
      dx: layout.dx,
      dy: layout.dy,
    });
  }
  Ok(())
}

/// Mesh `volume` into `output`.
///
/// The output file is opened before any stage starts; failure to open it
/// aborts the run. Decode failures only skip the affected layer. When
/// `cancel` fires the layers already in flight are finished and the mesh is
/// finalized normally.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "pipeline::run_pipeline"))]
pub fn run_pipeline<D, C>(
  volume: &VolumeGeometry,
  decoder: &D,
  cancel: &C,
  settings: &PipelineSettings,
  output: &Path,
  log: &LogHandle,
) -> Result<PipelineReport, PipelineError>
where
  D: SliceDecoder + Sync + ?Sized,
  C: CancelSignal + ?Sized,
{
  let start = Instant::now();
  let layout = volume.layout();
  validate_layout(&layout)?;

  let writer = StlWriter::create(output, settings.format)?;
  let workers = cell_pool(settings.cell_threads)?;

  log::info!(
    "Start triangulation: {} slices, {}x{} samples, isolevel {}",
    volume.slices.len(),
    layout.dx,
    layout.dy,
    settings.isolevel
  );

  let (pair_tx, pair_rx) = pool::link("slice-reader", POOL_DEPTH, || {
    SlicePair::new(layout.dx, layout.dy)
  });
  let (cell_tx, cell_rx) = pool::link("cell-builder", POOL_DEPTH, || CellLayer::new(&layout));
  let isolevel = settings.isolevel;

  let (reader, builder, triangulator) = thread::scope(|s| {
    let reader_log = log.clone();
    let reader = spawn_stage(s, "slice-reader", move || {
      run_reader(&volume.slices, decoder, cancel, &pair_tx, &reader_log)
    })?;
    let builder = spawn_stage(s, "cell-builder", move || {
      run_builder(&layout, &pair_rx, &cell_tx, &workers)
    })?;
    let triangulator_log = log.clone();
    let triangulator = spawn_stage(s, "triangulator", move || {
      run_triangulator(&cell_rx, isolevel, writer, &triangulator_log)
    })?;

    Ok::<_, PipelineError>((
      join_stage("slice-reader", reader),
      join_stage("cell-builder", builder),
      join_stage("triangulator", triangulator),
    ))
  })?;

  let (reader, _built, triangulator) = match (
    reader.and_then(|r| r),
    builder.and_then(|r| r),
    triangulator.and_then(|r| r),
  ) {
    (Ok(reader), Ok(built), Ok(triangulator)) => (reader, built, triangulator),
    (reader, builder, triangulator) => {
      return Err(root_cause([reader.err(), builder.err(), triangulator.err()]));
    }
  };

  let report = PipelineReport {
    layers_built: triangulator.layers,
    layers_skipped: reader.skipped,
    triangles: triangulator.triangles,
    cancelled: reader.cancelled,
    elapsed: start.elapsed(),
  };

  log::info!(
    "Triangulation finished: {} layers, {} skipped, {} triangles in {:.2?}{}",
    report.layers_built,
    report.layers_skipped,
    report.triangles,
    report.elapsed,
    if report.cancelled { " (cancelled)" } else { "" }
  );
  Ok(report)
}

/// A failing stage disconnects its neighbours, which then fail too. Report
/// the error that started the cascade.
fn root_cause(errors: [Option<PipelineError>; 3]) -> PipelineError {
  let mut errors: Vec<PipelineError> = errors.into_iter().flatten().collect();
  let primary = errors
    .iter()
    .position(|e| !matches!(e, PipelineError::Disconnected { .. }))
    .unwrap_or(0);
  errors.swap_remove(primary)
}

#[cfg(test)]
#[path = "process_test.rs"]
mod process_test;
