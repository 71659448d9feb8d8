//! Grid-cell builder stage.

use rayon::ThreadPool;

use super::types::SlicePair;
use crate::error::PipelineError;
use crate::grid_cell::{build_layer, CellLayer, LayerLayout};
use crate::pool::{Consumer, Handoff, Producer};

/// Turn each slice pair into a cell layer until the sentinel arrives.
///
/// The slice buffer is released as soon as its layer is built, before the
/// layer is published. Layer indices count built layers, so a skipped pair
/// leaves no gap in z. Returns the number of layers built.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "pipeline::builder"))]
pub fn run_builder(
  layout: &LayerLayout,
  pairs: &Consumer<SlicePair>,
  cells: &Producer<CellLayer>,
  workers: &ThreadPool,
) -> Result<usize, PipelineError> {
  let mut layer_index = 0;

  loop {
    let pair = match pairs.receive()? {
      Handoff::Filled(pair) => pair,
      Handoff::End => {
        cells.finish()?;
        return Ok(layer_index);
      }
    };

    let mut layer = cells.acquire()?;
    workers.install(|| {
      build_layer(
        layout,
        layer_index,
        &pair.top.samples,
        &pair.bottom.samples,
        &mut layer,
      )
    });
    drop(pair);

    cells.publish(layer)?;
    layer_index += 1;
  }
}
