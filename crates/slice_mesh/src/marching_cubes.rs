//! Per-cell isosurface extraction.
//!
//! Classic marching cubes: classify the eight corners against the isolevel,
//! look up the crossed edges and the triangle pattern for the resulting
//! case, and place one vertex on each crossed edge by linear interpolation.
//!
//! A corner is *inside* when its value is strictly below the isolevel; a
//! corner sitting exactly on the isolevel counts as outside.

use smallvec::SmallVec;

use crate::constants::{CELL_EDGES, MAX_CELL_TRIANGLES};
use crate::edge_table::{EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::geometry::{Triangle, Vec3};
use crate::grid_cell::{GridCell, Sample};

/// Triangles emitted for one cell.
pub type CellTriangles = SmallVec<[Triangle; MAX_CELL_TRIANGLES]>;

/// 8-bit case index: bit `i` set when corner `i` is inside.
#[inline]
pub fn corner_mask(values: &[Sample; 8], isolevel: Sample) -> u8 {
  let mut mask = 0u8;
  for (i, &value) in values.iter().enumerate() {
    if value < isolevel {
      mask |= 1 << i;
    }
  }
  mask
}

/// Point on the segment `p1 → p2` where the field crosses `isolevel`.
///
/// Always a convex combination of the two endpoints.
#[inline]
pub fn interpolate_edge(isolevel: Sample, p1: Vec3, p2: Vec3, v1: Sample, v2: Sample) -> Vec3 {
  if v1 == v2 {
    return p1;
  }
  let mu = (f64::from(isolevel) - f64::from(v1)) / (f64::from(v2) - f64::from(v1));
  let mu = mu.clamp(0.0, 1.0) as f32;
  p1 + (p2 - p1) * mu
}

/// Triangulate one cell.
///
/// Triangles come out in the case table's order, so the result depends
/// only on the cell and the isolevel.
pub fn polygonise(cell: &GridCell, isolevel: Sample) -> CellTriangles {
  let mut triangles = CellTriangles::new();
  let mask = corner_mask(&cell.values, isolevel);
  let edges = EDGE_TABLE[mask as usize];
  if edges == 0 {
    return triangles;
  }

  let mut crossings = [Vec3::ZERO; CELL_EDGES];
  for (edge, [a, b]) in EDGE_CORNERS.iter().enumerate() {
    if edges & (1 << edge) != 0 {
      let (a, b) = (*a as usize, *b as usize);
      crossings[edge] = interpolate_edge(
        isolevel,
        cell.positions[a],
        cell.positions[b],
        cell.values[a],
        cell.values[b],
      );
    }
  }

  for tri in TRI_TABLE[mask as usize].chunks_exact(3) {
    if tri[0] < 0 {
      break;
    }
    triangles.push(Triangle::new(
      crossings[tri[0] as usize],
      crossings[tri[1] as usize],
      crossings[tri[2] as usize],
    ));
  }

  triangles
}

#[cfg(test)]
#[path = "marching_cubes_test.rs"]
mod marching_cubes_test;
