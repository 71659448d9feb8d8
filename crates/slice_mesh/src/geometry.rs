//! Vector and triangle primitives.
//!
//! `Vec3` is glam's single-precision vector; every operation the pipeline
//! needs (difference, cross product, length, normalize) is provided there.

pub use glam::Vec3;

/// Normalize `v`, returning zero for degenerate input.
///
/// `glam::Vec3::normalize` would yield NaN for a zero-length vector, which
/// would poison the normal written to the mesh file.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
  let len = v.length();
  if len > f32::EPSILON {
    v / len
  } else {
    Vec3::ZERO
  }
}

/// Three vertices, wound counter-clockwise when viewed from outside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
  pub vertices: [Vec3; 3],
}

impl Triangle {
  #[inline]
  pub const fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
    Self {
      vertices: [a, b, c],
    }
  }

  /// Unit face normal: `(v1 - v0) × (v2 - v1)`, normalized.
  ///
  /// Zero for degenerate (collinear) triangles.
  #[inline]
  pub fn face_normal(&self) -> Vec3 {
    let [v0, v1, v2] = self.vertices;
    normalize_or_zero((v1 - v0).cross(v2 - v1))
  }
}

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;
