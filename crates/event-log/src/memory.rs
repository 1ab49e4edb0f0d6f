//! In-memory event log

use lane_counter::CountEvent;
use tracing::info;
use crate::{EventSink, StorageError};

/// Event log kept in memory (tests, dry runs)
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Vec<CountEvent>,
    closed: bool,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        info!("Creating in-memory event log");
        Self::default()
    }

    pub fn events(&self) -> &[CountEvent] {
        &self.events
    }
}

impl EventSink for MemoryEventLog {
    fn append(&mut self, event: &CountEvent) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        self.events.push(event.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_log_order_and_rejects_after_close() {
        let mut log = MemoryEventLog::new();
        for (track_id, lane) in [(1, 1), (2, 2), (3, 1)] {
            log.append(&CountEvent {
                track_id,
                lane,
                frame_index: track_id as u64,
                timestamp_sec: 0.0,
            })
            .unwrap();
        }

        let order: Vec<(u32, usize)> = log.events().iter().map(|e| (e.track_id, e.lane)).collect();
        assert_eq!(order, vec![(1, 1), (2, 2), (3, 1)]);

        log.close().unwrap();
        let first = log.events()[0].clone();
        let late = log.append(&first);
        assert!(matches!(late, Err(StorageError::Closed)));
    }
}
