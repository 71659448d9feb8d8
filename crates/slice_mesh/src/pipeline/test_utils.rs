//! Test utilities for pipeline tests.
//!
//! Provides in-memory slice volumes, failure-injecting decoders and scratch
//! directories so each stage can be exercised without image files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cancel::CancelToken;
use crate::decode::{MetadataReader, SliceDecoder, SliceMetadata};
use crate::error::DecodeError;
use crate::geometry::Vec3;
use crate::grid_cell::{Sample, ScalarSlice};
use crate::source::{SliceDescriptor, VolumeGeometry};

// =============================================================================
// Scratch directories
// =============================================================================

/// Unique temporary directory, removed on drop.
pub struct ScratchDir {
  path: PathBuf,
}

impl ScratchDir {
  pub fn new(label: &str) -> Self {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("slice_mesh_{}_{}_{}", label, std::process::id(), n));
    let _ = fs::remove_dir_all(&path);
    fs::create_dir_all(&path).unwrap();
    Self { path }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for ScratchDir {
  fn drop(&mut self) {
    let _ = fs::remove_dir_all(&self.path);
  }
}

// =============================================================================
// In-memory volumes
// =============================================================================

/// Slices held in memory, addressed as `mem/slice_<index>`.
pub struct MemoryVolume {
  pub dx: usize,
  pub dy: usize,
  pub slices: Vec<Vec<Sample>>,
  /// Slice indices whose decode fails.
  pub failing: HashSet<usize>,
  /// Fire `token` while decoding slice `index`.
  pub cancel_on: Option<(usize, CancelToken)>,
  decodes: AtomicUsize,
}

impl MemoryVolume {
  pub fn new(dx: usize, dy: usize, slices: Vec<Vec<Sample>>) -> Self {
    for slice in &slices {
      assert_eq!(slice.len(), dx * dy);
    }
    Self {
      dx,
      dy,
      slices,
      failing: HashSet::new(),
      cancel_on: None,
      decodes: AtomicUsize::new(0),
    }
  }

  /// `count` slices filled with `value`.
  pub fn uniform(dx: usize, dy: usize, count: usize, value: Sample) -> Self {
    Self::new(dx, dy, vec![vec![value; dx * dy]; count])
  }

  /// Sphere of `radius` samples centred in an `n³` grid: samples hold the
  /// distance to the centre, scaled by 10.
  pub fn sphere(n: usize, radius: f32) -> Self {
    let c = (n as f32 - 1.0) / 2.0;
    let slices = (0..n)
      .map(|z| {
        let mut slice = Vec::with_capacity(n * n);
        for y in 0..n {
          for x in 0..n {
            let d = Vec3::new(x as f32 - c, y as f32 - c, z as f32 - c).length();
            slice.push(((d - radius) * 10.0).round() as Sample);
          }
        }
        slice
      })
      .collect();
    Self::new(n, n, slices)
  }

  pub fn failing_at(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
    self.failing.extend(indices);
    self
  }

  pub fn cancel_when_decoding(mut self, index: usize, token: CancelToken) -> Self {
    self.cancel_on = Some((index, token));
    self
  }

  /// Total decode calls so far.
  pub fn decodes(&self) -> usize {
    self.decodes.load(Ordering::Relaxed)
  }

  /// Geometry with slices stacked along z at `spacing`.
  pub fn geometry(&self, spacing: f32) -> VolumeGeometry {
    VolumeGeometry {
      dx: self.dx,
      dy: self.dy,
      spacing: Vec3::new(1.0, 1.0, spacing),
      slices: (0..self.slices.len())
        .map(|i| SliceDescriptor::new(slice_path(i), Vec3::new(0.0, 0.0, i as f32 * spacing)))
        .collect(),
    }
  }

  fn index_of(file: &Path) -> Option<usize> {
    file.file_name()?.to_str()?.strip_prefix("slice_")?.parse().ok()
  }
}

pub fn slice_path(index: usize) -> PathBuf {
  PathBuf::from(format!("mem/slice_{}", index))
}

impl SliceDecoder for MemoryVolume {
  fn decode(&self, slice: &SliceDescriptor, target: &mut ScalarSlice) -> Result<(), DecodeError> {
    self.decodes.fetch_add(1, Ordering::Relaxed);
    let index = Self::index_of(&slice.file).ok_or_else(|| DecodeError::Unreadable {
      path: slice.file.clone(),
      message: "not a memory slice".into(),
    })?;

    if let Some((at, token)) = &self.cancel_on {
      if *at == index {
        token.cancel();
      }
    }
    if self.failing.contains(&index) {
      return Err(DecodeError::Unreadable {
        path: slice.file.clone(),
        message: "injected failure".into(),
      });
    }

    assert_eq!(target.samples.len(), self.dx * self.dy);
    target.samples.copy_from_slice(&self.slices[index]);
    Ok(())
  }
}

impl MetadataReader for MemoryVolume {
  fn read_metadata(&self, file: &Path) -> Result<SliceMetadata, DecodeError> {
    let index = Self::index_of(file).ok_or_else(|| DecodeError::Unreadable {
      path: file.to_path_buf(),
      message: "not a memory slice".into(),
    })?;
    Ok(SliceMetadata {
      dx: self.dx,
      dy: self.dy,
      pixel_spacing: None,
      position: Some(Vec3::new(0.0, 0.0, index as f32)),
    })
  }
}

/// 3 slices of 4×4, all zero except sample (0, 0) of the first slice at 10.
pub fn single_corner_volume() -> MemoryVolume {
  let mut slices = vec![vec![0; 16]; 3];
  slices[0][0] = 10;
  MemoryVolume::new(4, 4, slices)
}

/// `layers + 1` slices of `n × n` where each layer crosses the isolevel 5
/// at every cell: slices alternate between 0 and 10.
pub fn striped_volume(n: usize, layers: usize) -> MemoryVolume {
  let slices = (0..=layers)
    .map(|i| vec![if i % 2 == 0 { 0 } else { 10 }; n * n])
    .collect();
  MemoryVolume::new(n, n, slices)
}
