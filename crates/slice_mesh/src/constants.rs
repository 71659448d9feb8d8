//! Pipeline and file-format constants.
//!
//! # Buffer Budget
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        IN-FLIGHT MEMORY                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  slice pairs:  POOL_DEPTH × 2 × (dx · dy) samples                       │
//! │  cell layers:  POOL_DEPTH × (dx - 1) · (dy - 1) cells                   │
//! │                                                                         │
//! │  Independent of the number of slices in the volume.                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Binary STL Layout
//!
//! ```text
//! Offset   Size   Content
//! ──────   ────   ─────────────────────────────────────
//!    0      80    header, zero-filled
//!   80       4    triangle count (u32, little endian)
//!   84    50·n    triangle records
//!
//! Record:  normal (3 × f32) | v0 (3 × f32) | v1 (3 × f32) | v2 (3 × f32) | attr (u16 = 0)
//! ```

/// Number of reusable buffers per inter-stage link.
pub const POOL_DEPTH: usize = 2;

/// Corners of one grid cell.
pub const CELL_CORNERS: usize = 8;

/// Edges of one grid cell.
pub const CELL_EDGES: usize = 12;

/// Most triangles the case table emits for a single cell.
pub const MAX_CELL_TRIANGLES: usize = 5;

/// Size of the zero-filled binary STL header.
pub const STL_HEADER_LEN: usize = 80;

/// Byte offset of the triangle count in a binary STL file.
pub const STL_COUNT_OFFSET: u64 = STL_HEADER_LEN as u64;

/// Size of one binary STL triangle record (12 floats + u16 attribute).
pub const STL_RECORD_LEN: usize = 50;

/// Suffix appended to the output name while a mesh is being streamed.
pub const PARTIAL_SUFFIX: &str = "part";

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
