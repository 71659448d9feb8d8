//! Cooperative cancellation.
//!
//! The reader stage polls a [`CancelSignal`] once per slice pair. Anything
//! can act as the signal: a [`CancelToken`] flipped from another thread, or a
//! closure wrapping some other input source.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait CancelSignal: Sync {
  fn is_cancelled(&self) -> bool;
}

/// Shared cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Release);
  }
}

impl CancelSignal for CancelToken {
  fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }
}

/// Signal that never fires.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
  fn is_cancelled(&self) -> bool {
    false
  }
}

impl<F> CancelSignal for F
where
  F: Fn() -> bool + Sync,
{
  fn is_cancelled(&self) -> bool {
    self()
  }
}
