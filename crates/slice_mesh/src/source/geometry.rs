//! Volume geometry: dimensions, spacing and slice order.

use super::{SliceDescriptor, SourceEntry};
use crate::decode::MetadataReader;
use crate::error::SourceError;
use crate::geometry::Vec3;
use crate::grid_cell::LayerLayout;

/// Everything the pipeline needs to know about the input volume.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeGeometry {
  pub dx: usize,
  pub dy: usize,
  /// Column, row and inter-slice spacing.
  pub spacing: Vec3,
  /// Slices in ascending order along the stacking axis.
  pub slices: Vec<SliceDescriptor>,
}

impl VolumeGeometry {
  pub fn layout(&self) -> LayerLayout {
    LayerLayout::new(self.dx, self.dy, self.spacing)
  }

  /// Adjacent slice pairs: `max(0, slices - 1)`.
  pub fn layer_count(&self) -> usize {
    self.slices.len().saturating_sub(1)
  }
}

/// Sort `slices` along the dominant axis and return the inter-slice spacing.
///
/// The axis is the one with the largest absolute position change between
/// the first two slices (ties prefer x, then y). Spacing is the extent along
/// that axis divided by `len - 1`, or 1.0 when that is zero or undefined.
pub fn order_slices(slices: &mut [SliceDescriptor]) -> f32 {
  if slices.len() < 2 {
    return 1.0;
  }

  let delta = (slices[1].position - slices[0].position).abs();
  let largest = delta.max_element();
  let axis = if largest == delta.x {
    0
  } else if largest == delta.y {
    1
  } else {
    2
  };

  slices.sort_by(|a, b| a.position[axis].total_cmp(&b.position[axis]));

  let first = slices[0].position[axis];
  let last = slices[slices.len() - 1].position[axis];
  let spacing = (last - first) / (slices.len() - 1) as f32;
  if spacing > 0.0 && spacing.is_finite() {
    spacing
  } else {
    1.0
  }
}

/// Read metadata for every entry and build the ordered volume.
///
/// Files whose metadata cannot be read are skipped with a warning.
/// Dimensions and pixel spacing come from the first readable file; slices
/// without a known position are placed at `(0, 0, ordinal)`.
pub fn resolve_volume<M>(entries: &[SourceEntry], reader: &M) -> Result<VolumeGeometry, SourceError>
where
  M: MetadataReader + ?Sized,
{
  let mut dims = None;
  let mut pixel_spacing = (1.0, 1.0);
  let mut slices = Vec::with_capacity(entries.len());

  for entry in entries {
    let meta = match reader.read_metadata(&entry.file) {
      Ok(meta) => meta,
      Err(err) => {
        log::warn!("skipping {}: {}", entry.file.display(), err);
        continue;
      }
    };

    if dims.is_none() {
      dims = Some((meta.dx, meta.dy));
      if let Some(spacing) = meta.pixel_spacing.or(entry.pixel_spacing) {
        pixel_spacing = spacing;
      }
    }

    let ordinal = slices.len() as f32;
    let position = meta
      .position
      .or(entry.position)
      .unwrap_or(Vec3::new(0.0, 0.0, ordinal));
    slices.push(SliceDescriptor::new(entry.file.clone(), position));
  }

  let Some((dx, dy)) = dims else {
    return Err(SourceError::NoDecodableSlice(entries.len()));
  };

  let slice_spacing = order_slices(&mut slices);
  let spacing = Vec3::new(pixel_spacing.0, pixel_spacing.1, slice_spacing);

  log::info!("Image properties: width {} height {}", dx, dy);
  log::info!(
    "Spacing properties: x {} y {} z {}",
    spacing.x,
    spacing.y,
    spacing.z
  );

  Ok(VolumeGeometry {
    dx,
    dy,
    spacing,
    slices,
  })
}

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;
