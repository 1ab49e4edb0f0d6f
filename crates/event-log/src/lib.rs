//! Reporting Sink
//!
//! Durable side of the counting pipeline: count events are appended to a
//! log as they happen, and the latest per-lane totals are kept for the
//! overlay and the end-of-session summary.

mod csv_log;
mod memory;
mod summary;

pub use csv_log::CsvEventLog;
pub use memory::MemoryEventLog;
pub use summary::SessionSummary;

use lane_counter::{CountEvent, FrameOutcome};
use thiserror::Error;
use tracing::debug;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Event log I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Event log already closed")]
    Closed,
}

/// Append-only destination for count events
pub trait EventSink {
    /// Persist one event; rows already written stay valid if a later call fails
    fn append(&mut self, event: &CountEvent) -> Result<(), StorageError>;

    /// Flush and release the destination
    fn close(&mut self) -> Result<(), StorageError>;
}

/// Event log plus the per-lane totals as of the last recorded frame
pub struct ReportingSink<S: EventSink> {
    sink: S,
    lane_counts: Vec<u64>,
    events_written: u64,
}

impl<S: EventSink> ReportingSink<S> {
    pub fn new(sink: S, lane_count: usize) -> Self {
        Self {
            sink,
            lane_counts: vec![0; lane_count],
            events_written: 0,
        }
    }

    /// Append the frame's events in order and take its count snapshot
    pub fn record(&mut self, outcome: &FrameOutcome) -> Result<(), StorageError> {
        for event in &outcome.events {
            self.sink.append(event)?;
            self.events_written += 1;
        }
        self.lane_counts.clone_from(&outcome.lane_counts);

        if !outcome.events.is_empty() {
            debug!(
                "Frame {}: logged {} events ({} total)",
                outcome.frame_index,
                outcome.events.len(),
                self.events_written
            );
        }
        Ok(())
    }

    /// Counts to display for the frame just recorded
    pub fn lane_counts(&self) -> &[u64] {
        &self.lane_counts
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Close the underlying log and hand it back
    pub fn finish(mut self) -> Result<S, StorageError> {
        self.sink.close()?;
        Ok(self.sink)
    }
}
