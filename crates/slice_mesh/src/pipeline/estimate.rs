//! Processing-time estimate.
//!
//! Runs the first slice pair through decode → build → triangulate → write
//! on the calling thread and scales the wall time up to the whole volume.
//! Per-layer cost is assumed uniform, which only holds roughly: layers
//! crossing more surface take longer.

use std::fs;
use std::path::Path;
use std::time::Duration;

use web_time::Instant;

use super::process::validate_layout;
use super::triangulator::triangulate_layer;
use super::types::{PipelineSettings, SlicePair};
use crate::decode::SliceDecoder;
use crate::error::PipelineError;
use crate::grid_cell::{build_layer, CellLayer, ScalarSlice};
use crate::log_sink::LogHandle;
use crate::source::{SliceDescriptor, VolumeGeometry};
use crate::stl::StlWriter;
use crate::threading::cell_pool;

/// Time one layer and extrapolate: `measured × (slices / 2)`.
///
/// The probe mesh is written to `probe_path` and deleted afterwards.
/// Volumes with fewer than two slices estimate to zero.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "pipeline::estimate"))]
pub fn estimate_processing_time<D>(
  volume: &VolumeGeometry,
  decoder: &D,
  settings: &PipelineSettings,
  probe_path: &Path,
  log: &LogHandle,
) -> Result<Duration, PipelineError>
where
  D: SliceDecoder + ?Sized,
{
  let [top, bottom, ..] = volume.slices.as_slice() else {
    return Ok(Duration::ZERO);
  };
  let layout = volume.layout();
  validate_layout(&layout)?;

  log::info!("Start time estimation ...");
  let start = Instant::now();

  let mut writer = StlWriter::create(probe_path, settings.format)?;
  let single = cell_pool(Some(1))?;
  let mut pair = SlicePair::new(layout.dx, layout.dy);
  let mut layer = CellLayer::new(&layout);

  let loaded =
    decode_probe(decoder, top, &mut pair.top, log) && decode_probe(decoder, bottom, &mut pair.bottom, log);
  if loaded {
    single.install(|| build_layer(&layout, 0, &pair.top.samples, &pair.bottom.samples, &mut layer));
    triangulate_layer(&layer, settings.isolevel, &mut writer)?;
  }
  writer.finish()?;

  let measured = start.elapsed();
  let _ = fs::remove_file(probe_path);

  let factor = u32::try_from(volume.slices.len() / 2).unwrap_or(u32::MAX);
  Ok(measured.saturating_mul(factor))
}

fn decode_probe<D>(
  decoder: &D,
  slice: &SliceDescriptor,
  target: &mut ScalarSlice,
  log: &LogHandle,
) -> bool
where
  D: SliceDecoder + ?Sized,
{
  match decoder.decode(slice, target) {
    Ok(()) => true,
    Err(err) => {
      log.warn(err.to_string());
      false
    }
  }
}

/// Split a duration into whole hours, minutes and seconds.
pub fn split_hms(duration: Duration) -> (u64, u64, u64) {
  let secs = duration.as_secs();
  (secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
#[path = "estimate_test.rs"]
mod estimate_test;
