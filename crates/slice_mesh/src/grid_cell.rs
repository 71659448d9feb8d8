//! Grid cells and cell layers.
//!
//! A cell is the cube spanned by four neighbouring samples of one slice and
//! the same four samples of the next slice.
//!
//! ```text
//!   top slice (earlier, z₁)        bottom slice (later, z₂)
//!
//!   7 (x,y+1) ── 6 (x+1,y+1)       3 (x,y+1) ── 2 (x+1,y+1)
//!   │                  │           │                  │
//!   4 (x,y) ──── 5 (x+1,y)         0 (x,y) ──── 1 (x+1,y)
//! ```
//!
//! The corner numbering is the one `edge_table` is built for.

use rayon::prelude::*;

use crate::geometry::Vec3;

/// Scalar sample type shared by slice buffers and cells.
///
/// Wide enough for signed and unsigned 16-bit pixel data.
pub type Sample = i32;

/// One decoded image: `dx * dy` samples, row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScalarSlice {
  pub dx: usize,
  pub dy: usize,
  pub samples: Vec<Sample>,
}

impl ScalarSlice {
  pub fn new(dx: usize, dy: usize) -> Self {
    Self {
      dx,
      dy,
      samples: vec![0; dx * dy],
    }
  }
}

/// One cubic sampling cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridCell {
  pub positions: [Vec3; 8],
  pub values: [Sample; 8],
}

/// Dimensions and spacing shared by every layer of a volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerLayout {
  /// Samples per row.
  pub dx: usize,
  /// Rows per slice.
  pub dy: usize,
  /// Column, row and slice spacing.
  pub spacing: Vec3,
}

impl LayerLayout {
  pub fn new(dx: usize, dy: usize, spacing: Vec3) -> Self {
    Self { dx, dy, spacing }
  }

  /// Samples in one slice.
  #[inline]
  pub fn slice_len(&self) -> usize {
    self.dx * self.dy
  }

  /// Cells in one layer: `(dx - 1) * (dy - 1)`.
  #[inline]
  pub fn cell_count(&self) -> usize {
    self.dx.saturating_sub(1) * self.dy.saturating_sub(1)
  }
}

/// All cells between two adjacent slices.
#[derive(Clone, Debug)]
pub struct CellLayer {
  /// Index of the layer within the run (counts built layers only).
  pub layer: usize,
  pub cells: Vec<GridCell>,
}

impl CellLayer {
  /// Allocate a layer sized for `layout`. The buffer is never resized.
  pub fn new(layout: &LayerLayout) -> Self {
    Self {
      layer: 0,
      cells: vec![GridCell::default(); layout.cell_count()],
    }
  }
}

/// Fill `layer` from two adjacent slices.
///
/// `top` is the earlier slice, placed at `z = layer_index * spacing.z`;
/// `bottom` the later one, one slice spacing further. Cells are independent,
/// so they are built in parallel on the current rayon pool.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "grid_cell::build_layer"))]
pub fn build_layer(
  layout: &LayerLayout,
  layer_index: usize,
  top: &[Sample],
  bottom: &[Sample],
  layer: &mut CellLayer,
) {
  debug_assert_eq!(top.len(), layout.slice_len());
  debug_assert_eq!(bottom.len(), layout.slice_len());
  debug_assert_eq!(layer.cells.len(), layout.cell_count());

  let dx = layout.dx;
  let cols = dx - 1;
  let spacing = layout.spacing;
  let z_top = layer_index as f32 * spacing.z;
  let z_bottom = (layer_index + 1) as f32 * spacing.z;

  layer.layer = layer_index;
  layer.cells.par_iter_mut().enumerate().for_each(|(i, cell)| {
    let x = i % cols;
    let y = i / cols;

    // (x,y) (x+1,y) (x+1,y+1) (x,y+1)
    let offsets = [(0, 0), (1, 0), (1, 1), (0, 1)];
    for (k, (ox, oy)) in offsets.into_iter().enumerate() {
      let sx = x + ox;
      let sy = y + oy;
      let idx = sy * dx + sx;
      let px = sx as f32 * spacing.x;
      let py = sy as f32 * spacing.y;

      cell.positions[k] = Vec3::new(px, py, z_bottom);
      cell.values[k] = bottom[idx];
      cell.positions[k + 4] = Vec3::new(px, py, z_top);
      cell.values[k + 4] = top[idx];
    }
  });
}

#[cfg(test)]
#[path = "grid_cell_test.rs"]
mod grid_cell_test;
