//! Slice-pair reader stage.
//!
//! Walks adjacent descriptor pairs `(i, i + 1)`, decodes both slices into a
//! pooled [`SlicePair`] and publishes it. Each iteration ends in exactly one
//! [`PairOutcome`]:
//!
//! ```text
//!              acquire (or reuse retained)
//!                        │
//!                 decode top, bottom
//!                  ┌─────┴──────┐
//!               both ok      any failed
//!                  │            │
//!              Delivered   SkippedRetainBuffer(token)
//!           (token published)  (token kept for the next pair)
//!
//!   no pairs left / cancelled ──► End (retained token released, sentinel sent)
//! ```
//!
//! A failed pair never reaches the builder, so its token would never come
//! back through the free channel. Carrying it in the outcome and reusing it
//! keeps the acquire/release count balanced.

use super::types::SlicePair;
use crate::cancel::CancelSignal;
use crate::decode::SliceDecoder;
use crate::error::PipelineError;
use crate::grid_cell::ScalarSlice;
use crate::log_sink::LogHandle;
use crate::pool::{PoolToken, Producer};
use crate::source::SliceDescriptor;

/// Result of one reader iteration.
pub enum PairOutcome {
  /// Both slices decoded; the buffer went downstream.
  Delivered,
  /// A slice failed; the buffer stays with the reader.
  SkippedRetainBuffer(PoolToken<SlicePair>),
  /// No more pairs, or cancellation was observed.
  End,
}

/// Counters reported by the reader once it stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderSummary {
  pub delivered: usize,
  pub skipped: usize,
  pub cancelled: bool,
}

/// Run the reader until the descriptors are exhausted or `cancel` fires.
///
/// Always ends by sending the terminal sentinel on `pairs`.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "pipeline::reader"))]
pub fn run_reader<D, C>(
  slices: &[SliceDescriptor],
  decoder: &D,
  cancel: &C,
  pairs: &Producer<SlicePair>,
  log: &LogHandle,
) -> Result<ReaderSummary, PipelineError>
where
  D: SliceDecoder + ?Sized,
  C: CancelSignal + ?Sized,
{
  let mut summary = ReaderSummary::default();
  let mut retained: Option<PoolToken<SlicePair>> = None;
  let mut remaining = slices.windows(2);

  loop {
    let outcome = match remaining.next() {
      None => PairOutcome::End,
      Some(_) if cancel.is_cancelled() => {
        summary.cancelled = true;
        PairOutcome::End
      }
      Some(pair) => {
        let token = match retained.take() {
          Some(token) => token,
          None => pairs.acquire()?,
        };
        load_pair(&pair[0], &pair[1], decoder, token, pairs, log)?
      }
    };

    match outcome {
      PairOutcome::Delivered => summary.delivered += 1,
      PairOutcome::SkippedRetainBuffer(token) => {
        summary.skipped += 1;
        retained = Some(token);
      }
      PairOutcome::End => break,
    }
  }

  // Release before the sentinel so the pool is whole once the builder sees End.
  drop(retained);
  pairs.finish()?;
  Ok(summary)
}

/// Decode one pair into `token` and publish it if both slices loaded.
fn load_pair<D>(
  top: &SliceDescriptor,
  bottom: &SliceDescriptor,
  decoder: &D,
  mut token: PoolToken<SlicePair>,
  pairs: &Producer<SlicePair>,
  log: &LogHandle,
) -> Result<PairOutcome, PipelineError>
where
  D: SliceDecoder + ?Sized,
{
  let pair = &mut *token;
  let loaded =
    decode_logged(decoder, top, &mut pair.top, log) && decode_logged(decoder, bottom, &mut pair.bottom, log);

  if loaded {
    pairs.publish(token)?;
    Ok(PairOutcome::Delivered)
  } else {
    Ok(PairOutcome::SkippedRetainBuffer(token))
  }
}

fn decode_logged<D>(decoder: &D, slice: &SliceDescriptor, target: &mut ScalarSlice, log: &LogHandle) -> bool
where
  D: SliceDecoder + ?Sized,
{
  match decoder.decode(slice, target) {
    Ok(()) => {
      log.info(format!("File {} processed", slice.file.display()));
      true
    }
    Err(err) => {
      log.warn(err.to_string());
      false
    }
  }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod reader_test;
