//! CSV event log

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use lane_counter::CountEvent;
use tracing::info;
use crate::{EventSink, StorageError};

const HEADER: &str = "track_id,lane,frame_index,timestamp_sec";

/// One row per count event, flushed as it is written
pub struct CsvEventLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows: u64,
}

impl CsvEventLog {
    /// Create (or truncate) the log and write the header row
    pub fn create(path: &Path) -> Result<Self, StorageError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HEADER)?;
        writer.flush()?;

        info!("Writing count events to {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl EventSink for CsvEventLog {
    fn append(&mut self, event: &CountEvent) -> Result<(), StorageError> {
        let writer = self.writer.as_mut().ok_or(StorageError::Closed)?;
        writeln!(
            writer,
            "{},{},{},{:.2}",
            event.track_id, event.lane, event.frame_index, event.timestamp_sec
        )?;
        writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(track_id: u32, lane: usize, frame_index: u64) -> CountEvent {
        CountEvent {
            track_id,
            lane,
            frame_index,
            timestamp_sec: frame_index as f64 / 30.0,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");

        let mut log = CsvEventLog::create(&path).unwrap();
        log.append(&event(5, 2, 10)).unwrap();
        log.append(&event(9, 1, 45)).unwrap();
        assert_eq!(log.rows(), 2);
        log.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "track_id,lane,frame_index,timestamp_sec\n5,2,10,0.33\n9,1,45,1.50\n"
        );
    }

    #[test]
    fn test_rows_visible_before_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");

        let mut log = CsvEventLog::create(&path).unwrap();
        log.append(&event(1, 3, 0)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(contents.lines().nth(1), Some("1,3,0,0.00"));
    }

    #[test]
    fn test_closed_log_rejects_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvEventLog::create(&dir.path().join("counts.csv")).unwrap();
        log.close().unwrap();
        log.close().unwrap();

        assert!(matches!(log.append(&event(1, 1, 0)), Err(StorageError::Closed)));
    }

    #[test]
    fn test_unwritable_path() {
        let result = CsvEventLog::create(Path::new("/nonexistent/dir/counts.csv"));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
