use std::sync::{Arc, Mutex};
use std::thread;

use log::Level;

use super::*;
use crate::cancel::{CancelToken, NeverCancel};
use crate::constants::POOL_DEPTH;
use crate::log_sink::LogSink;
use crate::error::DecodeError;
use crate::grid_cell::ScalarSlice;
use crate::pipeline::test_utils::MemoryVolume;
use crate::source::SliceDescriptor;
use crate::pool::{link, Handoff};

struct Run {
  summary: ReaderSummary,
  received: Vec<Vec<i32>>,
  acquired: usize,
  peak: usize,
  outstanding: usize,
  available: usize,
  log: Vec<(Level, String)>,
}

/// Run the reader against a draining consumer that records each pair's top
/// slice and drops the token straight away.
fn run<C: CancelSignal>(volume: &MemoryVolume, cancel: &C) -> Run {
  let geometry = volume.geometry(1.0);
  let (producer, consumer) = link("reader", POOL_DEPTH, || SlicePair::new(volume.dx, volume.dy));

  let records: Arc<Mutex<Vec<(Level, String)>>> = Arc::default();
  let sink_records = Arc::clone(&records);
  let sink = LogSink::with_target(move |level, text| {
    sink_records.lock().unwrap().push((level, text.to_string()))
  })
  .unwrap();

  let (summary, received) = thread::scope(|s| {
    let drain = s.spawn(|| {
      let mut received = Vec::new();
      while let Handoff::Filled(pair) = consumer.receive().unwrap() {
        received.push(pair.top.samples.clone());
      }
      received
    });
    let summary = run_reader(&geometry.slices, volume, cancel, &producer, &sink.handle()).unwrap();
    (summary, drain.join().unwrap())
  });
  sink.shutdown();

  let stats = producer.stats();
  let log = records.lock().unwrap().clone();
  Run {
    summary,
    received,
    acquired: stats.acquired(),
    peak: stats.peak(),
    outstanding: stats.outstanding(),
    available: producer.available(),
    log,
  }
}

/// Slice `i` holds `i` everywhere, so a pair is identified by its top value.
fn numbered(count: usize) -> MemoryVolume {
  MemoryVolume::new(2, 2, (0..count as i32).map(|i| vec![i; 4]).collect())
}

#[test]
fn test_all_pairs_delivered_in_order() {
  let run = run(&numbered(5), &NeverCancel);

  assert_eq!(
    run.summary,
    ReaderSummary {
      delivered: 4,
      skipped: 0,
      cancelled: false
    }
  );
  let tops: Vec<i32> = run.received.iter().map(|s| s[0]).collect();
  assert_eq!(tops, [0, 1, 2, 3]);
}

#[test]
fn test_failures_do_not_leak_buffers() {
  // 11 slices = 10 layers. Bad slices 2 and 5 spoil layers 1, 2, 4 and 5.
  let volume = numbered(11).failing_at([2, 5]);
  let run = run(&volume, &NeverCancel);

  assert_eq!(run.summary.delivered, 6);
  assert_eq!(run.summary.skipped, 4);
  let tops: Vec<i32> = run.received.iter().map(|s| s[0]).collect();
  assert_eq!(tops, [0, 3, 6, 7, 8, 9]);

  // A skipped pair's buffer is reused, not re-acquired.
  assert_eq!(run.acquired, 6);
  assert!(run.peak <= POOL_DEPTH);
  assert_eq!(run.outstanding, 0);
  assert_eq!(run.available, POOL_DEPTH);
}

#[test]
fn test_trailing_failure_releases_retained_buffer() {
  let volume = numbered(5).failing_at([4]);
  let run = run(&volume, &NeverCancel);

  assert_eq!(run.summary.delivered, 3);
  assert_eq!(run.summary.skipped, 1);
  assert_eq!(run.acquired, 4);
  assert_eq!(run.outstanding, 0);
  assert_eq!(run.available, POOL_DEPTH);
}

#[test]
fn test_every_pair_failing() {
  let volume = numbered(4).failing_at(0..4);
  let run = run(&volume, &NeverCancel);

  assert!(run.received.is_empty());
  assert_eq!(run.summary.skipped, 3);
  assert_eq!(run.acquired, 1);
  assert_eq!(run.available, POOL_DEPTH);
}

#[test]
fn test_logs_each_file_and_failure() {
  let volume = numbered(11).failing_at([2, 5]);
  let run = run(&volume, &NeverCancel);

  let warnings = run.log.iter().filter(|(l, _)| *l == Level::Warn).count();
  let processed = run.log.iter().filter(|(l, _)| *l == Level::Info).count();
  assert_eq!(warnings, 4);
  assert_eq!(processed, 14);
  assert_eq!(run.log[0], (Level::Info, "File mem/slice_0 processed".to_string()));
}

#[test]
fn test_cancelled_before_start() {
  let token = CancelToken::new();
  token.cancel();
  let volume = numbered(6);

  let run = run(&volume, &token);

  assert!(run.summary.cancelled);
  assert_eq!(run.summary.delivered, 0);
  assert_eq!(run.acquired, 0);
  assert_eq!(volume.decodes(), 0);
}

#[test]
fn test_cancel_observed_before_next_pair() {
  let token = CancelToken::new();
  // Slice 3 is the bottom of pair 2; the check before pair 3 stops the run.
  let volume = numbered(10).cancel_when_decoding(3, token.clone());

  let run = run(&volume, &token);

  assert!(run.summary.cancelled);
  assert_eq!(run.summary.delivered, 3);
  assert_eq!(run.outstanding, 0);
  assert_eq!(run.available, POOL_DEPTH);
}

#[test]
fn test_no_pairs_for_single_slice() {
  let run = run(&numbered(1), &NeverCancel);
  assert_eq!(run.summary, ReaderSummary::default());
  assert!(run.received.is_empty());
}

/// Rejects one file as an unsupported sample format, decodes the rest.
struct FloatSliceAt {
  volume: MemoryVolume,
  file: &'static str,
}

impl SliceDecoder for FloatSliceAt {
  fn decode(&self, slice: &SliceDescriptor, target: &mut ScalarSlice) -> Result<(), DecodeError> {
    if slice.file.to_str() == Some(self.file) {
      return Err(DecodeError::UnsupportedFormat {
        path: slice.file.clone(),
        format: "Rgb32F".into(),
      });
    }
    self.volume.decode(slice, target)
  }
}

#[test]
fn test_unsupported_format_skips_like_unreadable() {
  let decoder = FloatSliceAt {
    volume: numbered(5),
    file: "mem/slice_2",
  };
  let geometry = decoder.volume.geometry(1.0);
  let (producer, consumer) = link("reader", POOL_DEPTH, || SlicePair::new(2, 2));

  let records: Arc<Mutex<Vec<(Level, String)>>> = Arc::default();
  let sink_records = Arc::clone(&records);
  let sink = LogSink::with_target(move |level, text| {
    sink_records.lock().unwrap().push((level, text.to_string()))
  })
  .unwrap();

  let (summary, tops) = thread::scope(|s| {
    let drain = s.spawn(|| {
      let mut tops = Vec::new();
      while let Handoff::Filled(pair) = consumer.receive().unwrap() {
        tops.push(pair.top.samples[0]);
      }
      tops
    });
    let summary = run_reader(&geometry.slices, &decoder, &NeverCancel, &producer, &sink.handle()).unwrap();
    (summary, drain.join().unwrap())
  });
  sink.shutdown();

  // Same outcome as an unreadable slice 2: pairs (1, 2) and (2, 3) dropped.
  assert_eq!(summary.delivered, 2);
  assert_eq!(summary.skipped, 2);
  assert_eq!(tops, [0, 3]);
  assert_eq!(producer.stats().outstanding(), 0);
  assert_eq!(producer.available(), POOL_DEPTH);

  let warnings: Vec<String> = records
    .lock()
    .unwrap()
    .iter()
    .filter(|(level, _)| *level == Level::Warn)
    .map(|(_, text)| text.clone())
    .collect();
  assert_eq!(warnings.len(), 2);
  assert!(warnings.iter().all(|w| w.contains("unsupported sample format")));
}
