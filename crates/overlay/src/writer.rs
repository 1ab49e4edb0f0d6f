//! Annotated frame output

use std::fs;
use std::path::{Path, PathBuf};
use image::RgbImage;
use tracing::info;
use crate::OverlayError;

/// Writes annotated frames as `frame_NNNNNN.png` into one directory
pub struct AnnotatedFrameWriter {
    dir: PathBuf,
    frames_written: u64,
}

impl AnnotatedFrameWriter {
    /// Create the output directory if needed
    pub fn create(dir: &Path) -> Result<Self, OverlayError> {
        fs::create_dir_all(dir)?;
        info!("Writing annotated frames to {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            frames_written: 0,
        })
    }

    pub fn frame_path(&self, frame_index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", frame_index))
    }

    pub fn write(&mut self, frame_index: u64, img: &RgbImage) -> Result<(), OverlayError> {
        img.save(self.frame_path(frame_index))?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}
