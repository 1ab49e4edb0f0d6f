//! Session summary

use std::fmt;
use lane_counter::CountSummary;
use serde::Serialize;

/// Totals reported when a session ends, normally or by interruption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub counts: CountSummary,
    pub events_logged: u64,
    pub interrupted: bool,
}

impl SessionSummary {
    pub fn new(counts: CountSummary, events_logged: u64, interrupted: bool) -> Self {
        Self {
            counts,
            events_logged,
            interrupted,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== SUMMARY ===")?;
        for (i, count) in self.counts.lane_counts.iter().enumerate() {
            writeln!(f, "Lane {}: {}", i + 1, count)?;
        }
        writeln!(f, "Total vehicles: {}", self.counts.total)?;
        write!(
            f,
            "Frames processed: {} ({} decode gaps)",
            self.counts.frames_processed, self.counts.decode_gaps
        )?;
        if self.interrupted {
            write!(f, "\nSession interrupted; totals are partial")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let summary = SessionSummary::new(
            CountSummary {
                lane_counts: vec![4, 0, 2],
                total: 6,
                frames_processed: 120,
                decode_gaps: 1,
            },
            6,
            false,
        );

        let text = summary.to_string();
        assert!(text.contains("Lane 1: 4\nLane 2: 0\nLane 3: 2\n"));
        assert!(text.contains("Total vehicles: 6"));
        assert!(!text.contains("interrupted"));
    }

    #[test]
    fn test_interrupted_note() {
        let summary = SessionSummary::new(
            CountSummary {
                lane_counts: vec![1],
                total: 1,
                frames_processed: 3,
                decode_gaps: 0,
            },
            1,
            true,
        );
        assert!(summary.to_string().ends_with("totals are partial"));
    }
}
