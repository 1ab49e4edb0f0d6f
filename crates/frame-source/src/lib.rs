//! Frame Source Library for Lane Counting
//!
//! Input side of the counting pipeline. Detection and tracking run in an
//! external collaborator; this crate consumes what it produced:
//! - Per-frame detection batches (boxes, class ids, scores, track ids)
//! - Optional decoded frame images for annotation
//! - Rescaling from source pixels to the processed frame size
//!
//! Batches are pulled one at a time, strictly in frame order.

pub mod detection;
pub mod frame;
pub mod jsonl;

pub use detection::{BoundingBox, DetectionBatch, RawDetection};
pub use jsonl::JsonlSource;

use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frame source error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open source: {0}")]
    Open(String),

    #[error("Malformed detection record at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Image decode failed: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for SourceError {
    fn from(err: image::ImageError) -> Self {
        SourceError::Image(err.to_string())
    }
}

/// Stream properties reported by the source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source frame rate (0 when unknown)
    pub fps: f64,
    /// Source frame width in pixels
    pub width: u32,
    /// Source frame height in pixels
    pub height: u32,
}

impl SourceMetadata {
    /// Frame rate, falling back when the source reports none
    pub fn fps_or(&self, fallback: f64) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            fallback
        }
    }
}

/// Finite, non-restartable cursor over per-frame detection batches.
///
/// `next_batch` blocks until the next frame is available and returns
/// `Ok(None)` at end of stream. Frame indices advance by exactly one per
/// batch, including empty batches and decode gaps.
pub trait FrameSource {
    /// Stream properties, known before the first batch
    fn metadata(&self) -> SourceMetadata;

    /// Pull the next batch in frame order
    fn next_batch(&mut self) -> Result<Option<DetectionBatch>, SourceError>;
}

/// In-memory source over prepared batches
#[derive(Debug)]
pub struct VecSource {
    metadata: SourceMetadata,
    batches: VecDeque<DetectionBatch>,
}

impl VecSource {
    pub fn new(metadata: SourceMetadata, batches: Vec<DetectionBatch>) -> Self {
        Self {
            metadata,
            batches: batches.into(),
        }
    }
}

impl FrameSource for VecSource {
    fn metadata(&self) -> SourceMetadata {
        self.metadata
    }

    fn next_batch(&mut self) -> Result<Option<DetectionBatch>, SourceError> {
        Ok(self.batches.pop_front())
    }
}
