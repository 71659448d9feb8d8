//! Streaming slice-to-mesh pipeline.
//!
//! ```text
//! ┌──────────────┐  SlicePair   ┌──────────────┐  CellLayer   ┌──────────────┐  Triangle   ┌─────┐
//! │ slice-reader ├─────────────►│ cell-builder ├─────────────►│ triangulator ├────────────►│ STL │
//! └──────┬───────┘  (2 slots)   └──────────────┘  (2 slots)   └──────────────┘             └─────┘
//!        │
//!  cancel polled once per pair; End sentinel propagates stage by stage
//! ```
//!
//! # Stages
//!
//! 1. **Reader**: decodes adjacent slice pairs, skipping pairs that fail
//! 2. **Builder**: builds one layer of grid cells per pair (parallel via rayon)
//! 3. **Triangulator**: marching cubes over each layer, streaming to the
//!    STL writer
//!
//! Layers stay in ascending order end to end, and triangles within a layer
//! follow cell order, so output is deterministic for a given input.

pub mod types;

// Stage implementations
pub mod builder;
pub mod reader;
pub mod triangulator;

// Orchestration
pub mod estimate;
pub mod process;

#[cfg(test)]
pub mod test_utils;

pub use estimate::{estimate_processing_time, split_hms};
pub use process::run_pipeline;
pub use reader::{PairOutcome, ReaderSummary};
pub use triangulator::{triangulate_layer, TriangleSink, TriangulatorSummary};
pub use types::{PipelineReport, PipelineSettings, SlicePair};
