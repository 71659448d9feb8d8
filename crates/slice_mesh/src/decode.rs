//! Slice decoding seams and the image-file implementation.
//!
//! The pipeline only needs two capabilities from an imaging codec:
//! - [`MetadataReader`]: dimensions, pixel spacing and position of one file
//! - [`SliceDecoder`]: fill a [`ScalarSlice`] from one file
//!
//! [`ImageSlices`] provides both for greyscale image stacks through the
//! `image` crate. 8- and 16-bit samples are read as-is, colour images are
//! reduced to luminance, floating-point images are rejected.

use std::path::Path;

use image::DynamicImage;

use crate::error::DecodeError;
use crate::geometry::Vec3;
use crate::grid_cell::{Sample, ScalarSlice};
use crate::source::SliceDescriptor;

/// Per-file volume metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SliceMetadata {
  pub dx: usize,
  pub dy: usize,
  /// `(column, row)` spacing, if the file carries it.
  pub pixel_spacing: Option<(f32, f32)>,
  /// Position of the first sample, if the file carries it.
  pub position: Option<Vec3>,
}

pub trait MetadataReader {
  fn read_metadata(&self, file: &Path) -> Result<SliceMetadata, DecodeError>;
}

pub trait SliceDecoder {
  /// Overwrite `target` with the samples of `slice`.
  ///
  /// `target.dx`/`target.dy` are the expected dimensions; a file of any
  /// other size is rejected.
  fn decode(&self, slice: &SliceDescriptor, target: &mut ScalarSlice) -> Result<(), DecodeError>;
}

/// Greyscale image files decoded with the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageSlices;

impl MetadataReader for ImageSlices {
  fn read_metadata(&self, file: &Path) -> Result<SliceMetadata, DecodeError> {
    let (width, height) = image::image_dimensions(file).map_err(|e| DecodeError::Unreadable {
      path: file.to_path_buf(),
      message: e.to_string(),
    })?;
    Ok(SliceMetadata {
      dx: width as usize,
      dy: height as usize,
      pixel_spacing: None,
      position: None,
    })
  }
}

impl SliceDecoder for ImageSlices {
  fn decode(&self, slice: &SliceDescriptor, target: &mut ScalarSlice) -> Result<(), DecodeError> {
    let path = slice.file.as_path();
    let img = image::open(path).map_err(|e| DecodeError::Unreadable {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;

    decode_image(img, path, target)
  }
}

/// Copy a decoded image into `target`, converting to one channel.
///
/// Float images have no integer sample scale and are rejected.
pub fn decode_image(img: DynamicImage, path: &Path, target: &mut ScalarSlice) -> Result<(), DecodeError> {
  let (actual_dx, actual_dy) = (img.width() as usize, img.height() as usize);
  if (actual_dx, actual_dy) != (target.dx, target.dy) {
    return Err(DecodeError::DimensionMismatch {
      path: path.to_path_buf(),
      dx: target.dx,
      dy: target.dy,
      actual_dx,
      actual_dy,
    });
  }

  let samples = &mut target.samples;
  match img {
    DynamicImage::ImageLuma8(buf) => fill(samples, buf.as_raw().iter().copied()),
    DynamicImage::ImageLuma16(buf) => fill(samples, buf.as_raw().iter().copied()),
    DynamicImage::ImageLumaA8(buf) => fill(samples, buf.as_raw().iter().step_by(2).copied()),
    DynamicImage::ImageLumaA16(buf) => fill(samples, buf.as_raw().iter().step_by(2).copied()),
    colour @ (DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)) => {
      fill(samples, colour.to_luma8().into_raw())
    }
    colour @ (DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_)) => {
      fill(samples, colour.to_luma16().into_raw())
    }
    other => {
      return Err(DecodeError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: format!("{:?}", other.color()),
      })
    }
  }
  Ok(())
}

fn fill<P, I>(target: &mut [Sample], source: I)
where
  P: Into<Sample>,
  I: IntoIterator<Item = P>,
{
  // Length is already dx * dy; overwrite in place.
  for (dst, src) in target.iter_mut().zip(source) {
    *dst = src.into();
  }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;
