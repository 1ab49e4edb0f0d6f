//! Frame Annotation
//!
//! Draws the counting state onto each processed frame:
//! - Lane outlines and per-lane running counts
//! - Detection boxes with track-id labels and centroid markers
//!
//! Annotated frames are written as a numbered PNG sequence at the source
//! frame rate's cadence (one image per decoded frame).

mod font;
mod render;
mod writer;

pub use render::{FrameAnnotator, Palette};
pub use writer::AnnotatedFrameWriter;

use thiserror::Error;

/// Overlay error types
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Output I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encode failed: {0}")]
    Image(#[from] image::ImageError),
}
