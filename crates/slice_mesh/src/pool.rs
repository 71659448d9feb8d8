//! Buffer pool and hand-off link between two pipeline stages.
//!
//! A link owns a fixed set of pre-allocated buffers and two channels:
//!
//! ```text
//!              ┌──────────── free (tokens back to producer) ◄────────────┐
//!              ▼                                                         │
//!   Producer::acquire ─► fill ─► Producer::publish ─► filled ─► Consumer::receive
//!                                                                        │
//!                                                     token dropped ─────┘
//! ```
//!
//! A [`PoolToken`] is the only way to reach a buffer. It is move-only, so
//! once published the producer cannot touch the buffer again, and dropping
//! it (anywhere) returns the buffer to the free channel. Buffer accounting
//! therefore cannot leak: every acquire is matched by exactly one release.
//!
//! Acquiring blocks while all buffers are out; publishing blocks once the
//! filled channel holds `depth` tokens. A slow consumer throttles the
//! producer through both.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{self as channel, select, Receiver, Sender};

use crate::error::PipelineError;

struct Slot<T> {
  index: usize,
  buffer: T,
}

/// Buffer accounting for one link.
#[derive(Debug, Default)]
pub struct PoolStats {
  outstanding: AtomicUsize,
  peak: AtomicUsize,
  acquired: AtomicUsize,
}

impl PoolStats {
  /// Tokens currently held outside the free channel.
  pub fn outstanding(&self) -> usize {
    self.outstanding.load(Ordering::Acquire)
  }

  /// Highest number of simultaneously outstanding tokens.
  pub fn peak(&self) -> usize {
    self.peak.load(Ordering::Acquire)
  }

  /// Total successful acquisitions.
  pub fn acquired(&self) -> usize {
    self.acquired.load(Ordering::Acquire)
  }
}

/// Exclusive handle to one pooled buffer.
pub struct PoolToken<T> {
  // Taken exactly once, in `drop`.
  slot: ManuallyDrop<Slot<T>>,
  free: Sender<Slot<T>>,
  stats: Arc<PoolStats>,
}

impl<T> PoolToken<T> {
  /// Pool slot this token owns.
  pub fn slot(&self) -> usize {
    self.slot.index
  }
}

impl<T> Deref for PoolToken<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.slot.buffer
  }
}

impl<T> DerefMut for PoolToken<T> {
  fn deref_mut(&mut self) -> &mut T {
    &mut self.slot.buffer
  }
}

impl<T> Drop for PoolToken<T> {
  fn drop(&mut self) {
    // SAFETY: `slot` is never touched again after this point.
    let slot = unsafe { ManuallyDrop::take(&mut self.slot) };
    // Decrement first: once the slot is on the free channel a blocked
    // `acquire` may count it again.
    self.stats.outstanding.fetch_sub(1, Ordering::AcqRel);
    // Fails only once the producer is gone, and then nobody needs it back.
    let _ = self.free.send(slot);
  }
}

/// Message on the filled channel.
pub enum Handoff<T> {
  Filled(PoolToken<T>),
  /// Terminal sentinel: no more buffers will follow.
  End,
}

/// Upstream end of a link.
pub struct Producer<T> {
  name: &'static str,
  free_tx: Sender<Slot<T>>,
  free_rx: Receiver<Slot<T>>,
  filled: Sender<Handoff<T>>,
  consumer_alive: Receiver<()>,
  stats: Arc<PoolStats>,
}

/// Downstream end of a link.
pub struct Consumer<T> {
  name: &'static str,
  filled: Receiver<Handoff<T>>,
  // Dropping this wakes a producer blocked in `acquire`.
  _alive: Sender<()>,
}

/// Create a link with `depth` buffers built by `make`.
pub fn link<T, F>(name: &'static str, depth: usize, mut make: F) -> (Producer<T>, Consumer<T>)
where
  T: Send,
  F: FnMut() -> T,
{
  let (free_tx, free_rx) = channel::bounded(depth);
  let (filled_tx, filled_rx) = channel::bounded(depth);
  let (alive_tx, alive_rx) = channel::bounded(0);

  for index in 0..depth {
    // Capacity equals depth, so seeding never blocks.
    let _ = free_tx.send(Slot {
      index,
      buffer: make(),
    });
  }

  let producer = Producer {
    name,
    free_tx,
    free_rx,
    filled: filled_tx,
    consumer_alive: alive_rx,
    stats: Arc::default(),
  };
  let consumer = Consumer {
    name,
    filled: filled_rx,
    _alive: alive_tx,
  };
  (producer, consumer)
}

impl<T> Producer<T> {
  /// Take a free buffer, blocking until one is returned.
  pub fn acquire(&self) -> Result<PoolToken<T>, PipelineError> {
    let slot = select! {
      recv(self.free_rx) -> slot => slot.ok(),
      recv(self.consumer_alive) -> _ => None,
    };
    let Some(slot) = slot else {
      return Err(PipelineError::Disconnected { stage: self.name });
    };

    let outstanding = self.stats.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
    self.stats.peak.fetch_max(outstanding, Ordering::AcqRel);
    self.stats.acquired.fetch_add(1, Ordering::AcqRel);

    Ok(PoolToken {
      slot: ManuallyDrop::new(slot),
      free: self.free_tx.clone(),
      stats: Arc::clone(&self.stats),
    })
  }

  /// Hand a filled buffer downstream.
  pub fn publish(&self, token: PoolToken<T>) -> Result<(), PipelineError> {
    // On failure the token inside the error is dropped and returns home.
    self
      .filled
      .send(Handoff::Filled(token))
      .map_err(|_| PipelineError::Disconnected { stage: self.name })
  }

  /// Send the terminal sentinel.
  pub fn finish(&self) -> Result<(), PipelineError> {
    self
      .filled
      .send(Handoff::End)
      .map_err(|_| PipelineError::Disconnected { stage: self.name })
  }

  /// Buffers sitting in the free channel.
  pub fn available(&self) -> usize {
    self.free_rx.len()
  }

  pub fn stats(&self) -> Arc<PoolStats> {
    Arc::clone(&self.stats)
  }
}

impl<T> Consumer<T> {
  /// Next filled buffer or the terminal sentinel, in publication order.
  pub fn receive(&self) -> Result<Handoff<T>, PipelineError> {
    self
      .filled
      .recv()
      .map_err(|_| PipelineError::Disconnected { stage: self.name })
  }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
