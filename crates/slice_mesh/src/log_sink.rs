//! Asynchronous log sink.
//!
//! Pipeline stages hand `(level, text)` records to a single background
//! consumer instead of touching the logger themselves. Sending never blocks
//! on I/O. [`LogSink::shutdown`] enqueues a stop marker and waits until every
//! record queued before it has been delivered.
//!
//! ```text
//!   reader ──┐
//!   builder ─┼──► unbounded FIFO ──► "log-sink" thread ──► target
//!   triang. ─┘                                              (log::log! by default)
//! ```

use std::thread::{self, JoinHandle};

use crossbeam_channel::{self as channel, Sender};
use log::Level;

use crate::error::PipelineError;

/// `log` target used when forwarding records.
pub const STAGE_TARGET: &str = "slice_mesh::stages";

enum Message {
  Record(Level, String),
  Stop,
}

/// Owner of the consumer thread.
pub struct LogSink {
  sender: Sender<Message>,
  worker: Option<JoinHandle<()>>,
}

/// Cheap, cloneable producer side of a [`LogSink`].
#[derive(Clone)]
pub struct LogHandle {
  sender: Sender<Message>,
}

impl LogSink {
  /// Start a sink that forwards to the `log` facade.
  pub fn start() -> Result<Self, PipelineError> {
    Self::with_target(|level, text| log::log!(target: STAGE_TARGET, level, "{}", text))
  }

  /// Start a sink delivering records to `target` on the consumer thread.
  pub fn with_target<F>(mut target: F) -> Result<Self, PipelineError>
  where
    F: FnMut(Level, &str) + Send + 'static,
  {
    let (sender, receiver) = channel::unbounded::<Message>();

    let worker = thread::Builder::new()
      .name("log-sink".into())
      .spawn(move || {
        // Ends on Stop, or when every sender is gone.
        while let Ok(message) = receiver.recv() {
          match message {
            Message::Record(level, text) => target(level, &text),
            Message::Stop => break,
          }
        }
      })
      .map_err(|source| PipelineError::Spawn {
        name: "log-sink".into(),
        source,
      })?;

    Ok(Self {
      sender,
      worker: Some(worker),
    })
  }

  pub fn handle(&self) -> LogHandle {
    LogHandle {
      sender: self.sender.clone(),
    }
  }

  /// Drain everything enqueued so far and stop the consumer.
  pub fn shutdown(mut self) {
    self.stop();
  }

  fn stop(&mut self) {
    if let Some(worker) = self.worker.take() {
      let _ = self.sender.send(Message::Stop);
      let _ = worker.join();
    }
  }
}

impl Drop for LogSink {
  fn drop(&mut self) {
    self.stop();
  }
}

impl LogHandle {
  /// Enqueue a record. Records sent after shutdown are dropped.
  pub fn log(&self, level: Level, text: impl Into<String>) {
    let _ = self.sender.send(Message::Record(level, text.into()));
  }

  pub fn info(&self, text: impl Into<String>) {
    self.log(Level::Info, text);
  }

  pub fn warn(&self, text: impl Into<String>) {
    self.log(Level::Warn, text);
  }

  pub fn error(&self, text: impl Into<String>) {
    self.log(Level::Error, text);
  }

  pub fn debug(&self, text: impl Into<String>) {
    self.log(Level::Debug, text);
  }
}

#[cfg(test)]
#[path = "log_sink_test.rs"]
mod log_sink_test;
