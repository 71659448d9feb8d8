//! slice_mesh - Streaming isosurface extraction from 2-D slice stacks
//!
//! This crate turns an ordered stack of same-sized grayscale slices (typically
//! one series of a medical scan) into a triangle mesh written as STL. The
//! primary algorithm is Marching Cubes over the cells formed by each pair of
//! adjacent slices.
//!
//! # Features
//!
//! - **Streaming pipeline**: reader, cell builder and triangulator run
//!   concurrently, handing buffers over through depth-2 pools, so memory is
//!   bounded by two slice pairs and two cell layers regardless of stack size
//! - **Deterministic output**: layers and triangles are written in the same
//!   order whatever the thread count
//! - **Cooperative cancellation**: a partial mesh is still a valid file
//! - **Text and binary STL** with the triangle count patched in on finalize
//!
//! # Example
//!
//! ```ignore
//! use slice_mesh::{
//!   run_pipeline, CancelToken, ImageSlices, LogSink, PipelineSettings, Selection, SliceSource,
//! };
//!
//! let source = SliceSource::detect(input, "png", Selection::default());
//! let volume = source.resolve(&ImageSlices)?;
//!
//! let sink = LogSink::start()?;
//! let report = run_pipeline(
//!   &volume,
//!   &ImageSlices,
//!   &CancelToken::new(),
//!   &PipelineSettings::default(),
//!   &output,
//!   &sink.handle(),
//! )?;
//!
//! println!("{} layers, {} triangles", report.layers_built, report.triangles);
//! ```

pub mod constants;
pub mod edge_table;
pub mod error;
pub mod geometry;

// Re-export commonly used items
pub use constants::POOL_DEPTH;
pub use error::{DecodeError, PipelineError, SourceError};
pub use geometry::{Triangle, Vec3};

// Cells and Marching Cubes
pub mod grid_cell;
pub mod marching_cubes;
pub use grid_cell::{CellLayer, GridCell, LayerLayout, Sample, ScalarSlice};
pub use marching_cubes::polygonise;

// Mesh output
pub mod stl;
pub use stl::{StlFormat, StlWriter};

// Input discovery and decoding
pub mod decode;
pub mod source;
pub use decode::{ImageSlices, MetadataReader, SliceDecoder, SliceMetadata};
pub use source::{Selection, SliceDescriptor, SliceSource, SourceEntry, VolumeGeometry};

// Stage plumbing: buffer pools, threads, logging, cancellation
pub mod cancel;
pub mod log_sink;
pub mod pool;
pub mod threading;
pub use cancel::{CancelSignal, CancelToken, NeverCancel};
pub use log_sink::{LogHandle, LogSink};

// Pipeline task graph
pub mod pipeline;
pub use pipeline::{estimate_processing_time, run_pipeline, PipelineReport, PipelineSettings};
