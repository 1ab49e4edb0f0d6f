//! Lane Vehicle Counter
//!
//! Turns the per-frame detector/tracker stream into stable per-lane counts:
//! - Vehicle class and confidence filtering
//! - Centroid reduction of bounding boxes
//! - Lane assignment against fixed lane regions
//! - Exactly-once counting per (track, lane) with count events

pub mod catalog;
pub mod config;
pub mod engine;
pub mod observation;

pub use catalog::ClassCatalog;
pub use config::{CounterConfig, LanePolicy};
pub use engine::{
    AssignedObservation, CountEvent, CountSummary, FrameOutcome, LaneCountingEngine, LaneState,
};
pub use observation::{Observation, ObservationExtractor};

use frame_source::DetectionBatch;
use lane_geometry::{FrameDimensions, GeometryError};
use thiserror::Error;

/// Counter error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CounterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown vehicle class: {0}")]
    UnknownClass(String),

    #[error("Frame {got} arrived after frame {last}")]
    OutOfOrder { last: u64, got: u64 },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Lane counting module: extractor plus engine, one batch at a time
pub struct LaneCounter {
    extractor: ObservationExtractor,
    engine: LaneCountingEngine,
}

impl LaneCounter {
    /// Build lanes for `dims` and resolve vehicle classes against `catalog`
    pub fn new(
        config: &CounterConfig,
        catalog: &ClassCatalog,
        dims: FrameDimensions,
        fps: f64,
    ) -> Result<Self, CounterError> {
        config.validate()?;
        let class_ids = catalog.resolve(config.vehicle_classes.as_slice())?;

        Ok(Self {
            extractor: ObservationExtractor::new(class_ids, config.confidence_threshold),
            engine: LaneCountingEngine::new(dims, config.lane_count, config.lane_policy, fps)?,
        })
    }

    /// Count one frame's batch; decode gaps advance the frame index only
    pub fn process(&mut self, batch: &DetectionBatch) -> Result<FrameOutcome, CounterError> {
        if batch.is_gap() {
            return self.engine.record_gap(batch.frame_index);
        }

        let timestamp_sec = self.engine.timestamp_sec(batch.frame_index);
        let observations = self
            .extractor
            .extract(&batch.detections, batch.frame_index, timestamp_sec);
        self.engine.process_frame(batch.frame_index, observations)
    }

    pub fn engine(&self) -> &LaneCountingEngine {
        &self.engine
    }

    pub fn summary(&self) -> CountSummary {
        self.engine.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_source::{BoundingBox, RawDetection};

    fn detection(track_id: Option<u32>, class_id: u32, cx: i32) -> RawDetection {
        RawDetection {
            bbox: BoundingBox::new(cx - 10, 90, cx + 10, 110),
            class_id,
            confidence: 0.8,
            track_id,
        }
    }

    fn counter() -> LaneCounter {
        LaneCounter::new(
            &CounterConfig::default(),
            &ClassCatalog::coco(),
            FrameDimensions::new(900, 500).unwrap(),
            30.0,
        )
        .unwrap()
    }

    #[test]
    fn test_process_batches() {
        let mut counter = counter();

        let outcome = counter
            .process(&DetectionBatch::new(0, vec![detection(Some(5), 2, 310)]))
            .unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].lane, 2);

        let gap = counter.process(&DetectionBatch::gap(1)).unwrap();
        assert!(!gap.decoded);
        assert_eq!(gap.lane_counts, vec![0, 1, 0]);

        // Person (class 0) is never counted
        let outcome = counter
            .process(&DetectionBatch::new(2, vec![detection(Some(9), 0, 100)]))
            .unwrap();
        assert!(outcome.events.is_empty());
        assert!(outcome.observations.is_empty());

        let summary = counter.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(summary.decode_gaps, 1);
    }

    #[test]
    fn test_off_frame_box_is_observed_without_lane() {
        let mut counter = counter();
        let far_right = RawDetection {
            bbox: BoundingBox::new(2_000_000_000, 0, 2_100_000_000, 10),
            class_id: 2,
            confidence: 0.9,
            track_id: Some(3),
        };

        let outcome = counter.process(&DetectionBatch::new(0, vec![far_right])).unwrap();
        assert_eq!(outcome.observations.len(), 1);
        assert_eq!(outcome.observations[0].lane, None);
        assert!(outcome.events.is_empty());
        assert_eq!(counter.summary().total, 0);
    }

    #[test]
    fn test_unknown_class_rejected() {
        let config = CounterConfig {
            vehicle_classes: vec!["hovercraft".to_string()],
            ..Default::default()
        };
        let result = LaneCounter::new(
            &config,
            &ClassCatalog::coco(),
            FrameDimensions::new(640, 360).unwrap(),
            30.0,
        );
        assert!(matches!(result, Err(CounterError::UnknownClass(_))));
    }
}
