//! Detector/tracker output types

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in processed-frame pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from source-pixel corners, scaling each axis and truncating
    pub fn from_scaled(corners: [f32; 4], scale_x: f32, scale_y: f32) -> Self {
        Self {
            x1: (corners[0] * scale_x) as i32,
            y1: (corners[1] * scale_y) as i32,
            x2: (corners[2] * scale_x) as i32,
            y2: (corners[3] * scale_y) as i32,
        }
    }

    /// Integer midpoint `((x1+x2)/2, (y1+y2)/2)`, rounding toward negative infinity.
    /// Summed in i64 so boxes anywhere in the i32 range cannot overflow.
    pub fn centroid(&self) -> (i32, i32) {
        (midpoint(self.x1, self.x2), midpoint(self.y1, self.y2))
    }

    pub fn width(&self) -> u32 {
        span(self.x1, self.x2)
    }

    pub fn height(&self) -> u32 {
        span(self.y1, self.y2)
    }
}

// Midpoint of two i32 values always lies within i32
fn midpoint(a: i32, b: i32) -> i32 {
    (i64::from(a) + i64::from(b)).div_euclid(2) as i32
}

fn span(a: i32, b: i32) -> u32 {
    u32::try_from((i64::from(b) - i64::from(a)).unsigned_abs()).unwrap_or(u32::MAX)
}

/// One detection as produced by the external detector and tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Bounding box
    pub bbox: BoundingBox,

    /// Detector class id
    pub class_id: u32,

    /// Detection confidence
    pub confidence: f32,

    /// Persistent track id, when the tracker assigned one
    pub track_id: Option<u32>,
}

/// Everything the collaborator produced for one frame
#[derive(Debug, Clone)]
pub struct DetectionBatch {
    /// Zero-based frame index in the source video
    pub frame_index: u64,

    /// False when the frame could not be decoded (decode gap)
    pub decoded: bool,

    /// Decoded image, resized to the processed frame size
    pub frame: Option<RgbImage>,

    /// Detections, in detector order
    pub detections: Vec<RawDetection>,
}

impl DetectionBatch {
    /// A decoded frame with its detections
    pub fn new(frame_index: u64, detections: Vec<RawDetection>) -> Self {
        Self {
            frame_index,
            decoded: true,
            frame: None,
            detections,
        }
    }

    /// A frame the decoder could not produce
    pub fn gap(frame_index: u64) -> Self {
        Self {
            frame_index,
            decoded: false,
            frame: None,
            detections: Vec::new(),
        }
    }

    /// Attach the decoded image
    pub fn with_frame(mut self, frame: RgbImage) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn is_gap(&self) -> bool {
        !self.decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_truncates() {
        let bbox = BoundingBox::new(10, 20, 31, 41);
        assert_eq!(bbox.centroid(), (20, 30));
        assert_eq!(bbox.width(), 21);
        assert_eq!(bbox.height(), 21);
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let bbox = BoundingBox::new(2_000_000_000, 0, 2_100_000_000, 10);
        assert_eq!(bbox.centroid(), (2_050_000_000, 5));
        assert_eq!(bbox.width(), 100_000_000);

        let full = BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(full.centroid(), (-1, -1));
        assert_eq!(full.width(), u32::MAX);
        assert_eq!(full.height(), u32::MAX);

        // Saturating float casts land on the i32 extremes
        let saturated = BoundingBox::from_scaled([1e12, 0.0, 1e12, 10.0], 1.0, 1.0);
        assert_eq!(saturated.centroid(), (i32::MAX, 5));
    }

    #[test]
    fn test_from_scaled() {
        let bbox = BoundingBox::from_scaled([100.0, 50.0, 300.9, 151.0], 0.5, 0.5);
        assert_eq!(bbox, BoundingBox::new(50, 25, 150, 75));
    }

    #[test]
    fn test_gap_batch() {
        let batch = DetectionBatch::gap(7);
        assert!(batch.is_gap());
        assert_eq!(batch.frame_index, 7);
        assert!(batch.detections.is_empty());
        assert!(!DetectionBatch::new(8, vec![]).is_gap());
    }
}
