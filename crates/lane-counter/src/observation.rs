//! Observation extraction

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use frame_source::{BoundingBox, RawDetection};
use lane_geometry::Point;

/// A filtered, reduced detection used as counting input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Tracker id; `None` is never counted
    pub track_id: Option<u32>,

    /// Bounding box midpoint
    pub centroid: Point,

    /// Detector class id
    pub class_id: u32,

    /// Source box, kept for annotation
    pub bbox: BoundingBox,

    pub frame_index: u64,

    pub timestamp_sec: f64,
}

/// Filters raw detections to vehicles above the confidence threshold
#[derive(Debug, Clone)]
pub struct ObservationExtractor {
    vehicle_class_ids: HashSet<u32>,
    confidence_threshold: f32,
}

impl ObservationExtractor {
    pub fn new(vehicle_class_ids: HashSet<u32>, confidence_threshold: f32) -> Self {
        Self {
            vehicle_class_ids,
            confidence_threshold,
        }
    }

    /// Reduce one frame's detections, preserving detector order.
    ///
    /// No deduplication happens here; repeated track ids are passed through.
    pub fn extract(
        &self,
        detections: &[RawDetection],
        frame_index: u64,
        timestamp_sec: f64,
    ) -> Vec<Observation> {
        let observations: Vec<Observation> = detections
            .iter()
            .filter(|d| d.confidence >= self.confidence_threshold)
            .filter(|d| self.vehicle_class_ids.contains(&d.class_id))
            .map(|d| Observation {
                track_id: d.track_id,
                centroid: d.bbox.centroid().into(),
                class_id: d.class_id,
                bbox: d.bbox,
                frame_index,
                timestamp_sec,
            })
            .collect();

        debug!(
            "Frame {}: {} of {} detections kept",
            frame_index,
            observations.len(),
            detections.len()
        );
        observations
    }
}
