//! Streaming STL serializer.
//!
//! Triangles are written as they arrive to `<path>.part`. [`StlWriter::finish`]
//! closes the text form or patches the binary triangle count, then renames
//! the file into place. A writer dropped before `finish` removes its partial
//! file, so a failed run never leaves a half-written mesh behind.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::constants::{PARTIAL_SUFFIX, STL_COUNT_OFFSET, STL_HEADER_LEN, STL_RECORD_LEN};
use crate::error::PipelineError;
use crate::geometry::{Triangle, Vec3};

/// Output encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StlFormat {
  #[default]
  Text,
  Binary,
}

/// Incremental STL file writer.
pub struct StlWriter {
  out: Option<BufWriter<File>>,
  partial_path: PathBuf,
  final_path: PathBuf,
  format: StlFormat,
  triangles: u32,
}

impl StlWriter {
  /// Open the output for writing. Fails if the destination cannot be created.
  pub fn create(path: impl AsRef<Path>, format: StlFormat) -> Result<Self, PipelineError> {
    let final_path = path.as_ref().to_path_buf();
    let partial_path = partial_path_for(&final_path);

    let file = File::create(&partial_path).map_err(|source| PipelineError::OutputCreate {
      path: final_path.clone(),
      source,
    })?;

    let mut writer = Self {
      out: Some(BufWriter::new(file)),
      partial_path,
      final_path,
      format,
      triangles: 0,
    };

    match format {
      StlFormat::Text => writer.write_all(b"solid\n")?,
      StlFormat::Binary => {
        writer.write_all(&[0u8; STL_HEADER_LEN])?;
        // Placeholder, patched by `finish`.
        writer.write_all(&0u32.to_le_bytes())?;
      }
    }

    Ok(writer)
  }

  pub fn format(&self) -> StlFormat {
    self.format
  }

  /// Triangles appended so far.
  pub fn triangle_count(&self) -> u32 {
    self.triangles
  }

  /// Destination path the mesh ends up at after `finish`.
  pub fn path(&self) -> &Path {
    &self.final_path
  }

  /// Append one triangle; its normal is derived from the winding.
  ///
  /// Fails once the file holds `u32::MAX` triangles, the most the binary
  /// count field can describe.
  pub fn append(&mut self, triangle: &Triangle) -> Result<(), PipelineError> {
    let Some(count) = self.triangles.checked_add(1) else {
      return Err(PipelineError::TriangleLimit {
        path: self.final_path.clone(),
      });
    };
    let Some(out) = self.out.as_mut() else {
      return Ok(());
    };

    let normal = triangle.face_normal();
    let written = match self.format {
      StlFormat::Text => write_text_facet(out, normal, &triangle.vertices),
      StlFormat::Binary => write_binary_facet(out, normal, &triangle.vertices),
    };
    written.map_err(|source| PipelineError::Write {
      path: self.final_path.clone(),
      source,
    })?;

    self.triangles = count;
    Ok(())
  }

  /// Finalize the file and move it to its destination.
  ///
  /// Returns the number of triangles written.
  pub fn finish(mut self) -> Result<u32, PipelineError> {
    let Some(out) = self.out.take() else {
      return Ok(self.triangles);
    };

    if let Err(source) = self.seal(out) {
      let _ = fs::remove_file(&self.partial_path);
      return Err(PipelineError::Write {
        path: self.final_path.clone(),
        source,
      });
    }
    Ok(self.triangles)
  }

  fn seal(&self, mut out: BufWriter<File>) -> io::Result<()> {
    match self.format {
      StlFormat::Text => out.write_all(b"endsolid\n")?,
      StlFormat::Binary => {
        out.seek(SeekFrom::Start(STL_COUNT_OFFSET))?;
        out.write_all(&self.triangles.to_le_bytes())?;
      }
    }

    let file = out.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&self.partial_path, &self.final_path)
  }

  fn write_all(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
    let Some(out) = self.out.as_mut() else {
      return Ok(());
    };
    out.write_all(bytes).map_err(|source| PipelineError::Write {
      path: self.final_path.clone(),
      source,
    })
  }
}

impl Drop for StlWriter {
  fn drop(&mut self) {
    if self.out.take().is_some() {
      let _ = fs::remove_file(&self.partial_path);
    }
  }
}

fn write_text_facet<W: Write>(out: &mut W, normal: Vec3, vertices: &[Vec3; 3]) -> io::Result<()> {
  writeln!(out, "facet normal {} {} {}", normal.x, normal.y, normal.z)?;
  writeln!(out, "outer loop")?;
  for v in vertices {
    writeln!(out, "Vector {} {} {}", v.x, v.y, v.z)?;
  }
  writeln!(out, "endloop")?;
  writeln!(out, "endfacet")
}

fn write_binary_facet<W: Write>(out: &mut W, normal: Vec3, vertices: &[Vec3; 3]) -> io::Result<()> {
  let mut record = [0u8; STL_RECORD_LEN];
  let values = normal.to_array().into_iter().chain(vertices.iter().flat_map(|v| v.to_array()));
  for (i, value) in values.enumerate() {
    record[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
  }
  // Trailing attribute word stays zero.
  out.write_all(&record)
}

/// `<path>.part`
pub fn partial_path_for(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(".");
  name.push(PARTIAL_SUFFIX);
  PathBuf::from(name)
}

#[cfg(test)]
#[path = "stl_test.rs"]
mod stl_test;
