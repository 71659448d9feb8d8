//! Isosurface triangulator stage.

use crate::error::PipelineError;
use crate::geometry::Triangle;
use crate::grid_cell::{CellLayer, Sample};
use crate::log_sink::LogHandle;
use crate::marching_cubes::polygonise;
use crate::pool::{Consumer, Handoff};
use crate::stl::StlWriter;

/// Destination for extracted triangles.
pub trait TriangleSink {
  fn push_triangle(&mut self, triangle: &Triangle) -> Result<(), PipelineError>;
}

impl TriangleSink for StlWriter {
  fn push_triangle(&mut self, triangle: &Triangle) -> Result<(), PipelineError> {
    self.append(triangle)
  }
}

impl TriangleSink for Vec<Triangle> {
  fn push_triangle(&mut self, triangle: &Triangle) -> Result<(), PipelineError> {
    self.push(*triangle);
    Ok(())
  }
}

/// What the triangulator wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriangulatorSummary {
  pub layers: usize,
  pub triangles: u32,
}

/// Triangulate every cell of `layer` in index order.
///
/// Returns the number of triangles emitted.
pub fn triangulate_layer<S>(layer: &CellLayer, isolevel: Sample, sink: &mut S) -> Result<usize, PipelineError>
where
  S: TriangleSink + ?Sized,
{
  let mut emitted = 0;
  for cell in &layer.cells {
    for triangle in polygonise(cell, isolevel) {
      sink.push_triangle(&triangle)?;
      emitted += 1;
    }
  }
  Ok(emitted)
}

/// Consume cell layers until the sentinel, then finalize the mesh file.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "pipeline::triangulator"))]
pub fn run_triangulator(
  cells: &Consumer<CellLayer>,
  isolevel: Sample,
  mut writer: StlWriter,
  log: &LogHandle,
) -> Result<TriangulatorSummary, PipelineError> {
  let mut layers = 0;

  loop {
    match cells.receive()? {
      Handoff::Filled(layer) => {
        let emitted = triangulate_layer(&layer, isolevel, &mut writer)?;
        log.debug(format!("Layer {} triangulated: {} triangles", layer.layer, emitted));
        layers += 1;
      }
      Handoff::End => {
        let triangles = writer.finish()?;
        return Ok(TriangulatorSummary { layers, triangles });
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::Vec3;
  use crate::grid_cell::{build_layer, LayerLayout};

  #[test]
  fn test_triangulate_layer_in_cell_order() {
    let layout = LayerLayout::new(3, 2, Vec3::ONE);
    // Only the right-hand cell straddles the isolevel.
    let top = vec![0, 0, 10, 0, 0, 10];
    let bottom = vec![0, 0, 10, 0, 0, 10];
    let mut layer = CellLayer::new(&layout);
    build_layer(&layout, 0, &top, &bottom, &mut layer);

    let mut triangles: Vec<Triangle> = Vec::new();
    let emitted = triangulate_layer(&layer, 5, &mut triangles).unwrap();

    assert_eq!(emitted, triangles.len());
    assert_eq!(emitted, 2);
    for v in triangles.iter().flat_map(|t| t.vertices) {
      assert_eq!(v.x, 1.5);
    }
  }

  #[test]
  fn test_homogeneous_layer_emits_nothing() {
    let layout = LayerLayout::new(4, 4, Vec3::ONE);
    let slice = vec![3; 16];
    let mut layer = CellLayer::new(&layout);
    build_layer(&layout, 2, &slice, &slice, &mut layer);

    let mut triangles: Vec<Triangle> = Vec::new();
    assert_eq!(triangulate_layer(&layer, 5, &mut triangles).unwrap(), 0);
  }
}
