//! Thread helpers for the pipeline.
//!
//! - Stage threads are named scoped threads, one per stage.
//! - Cell building runs on a dedicated rayon pool so its width can be set
//!   per run without touching the global pool.

use std::thread::{Builder, Scope, ScopedJoinHandle};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::PipelineError;

/// Build the pool cell layers are constructed on.
///
/// `None` or `Some(0)` lets rayon pick the width (one thread per CPU).
pub fn cell_pool(threads: Option<usize>) -> Result<ThreadPool, PipelineError> {
  let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("cell-builder-{}", i));
  if let Some(threads) = threads.filter(|&n| n > 0) {
    builder = builder.num_threads(threads);
  }
  Ok(builder.build()?)
}

/// Spawn a named stage thread inside `scope`.
pub fn spawn_stage<'scope, 'env, F, T>(
  scope: &'scope Scope<'scope, 'env>,
  name: &'static str,
  work: F,
) -> Result<ScopedJoinHandle<'scope, T>, PipelineError>
where
  F: FnOnce() -> T + Send + 'scope,
  T: Send + 'scope,
{
  Builder::new()
    .name(name.to_string())
    .spawn_scoped(scope, work)
    .map_err(|source| PipelineError::Spawn {
      name: name.to_string(),
      source,
    })
}

/// Join a stage, turning a panic into [`PipelineError::StagePanicked`].
pub fn join_stage<T>(name: &'static str, handle: ScopedJoinHandle<'_, T>) -> Result<T, PipelineError> {
  handle
    .join()
    .map_err(|_| PipelineError::StagePanicked { stage: name })
}
