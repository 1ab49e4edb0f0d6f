//! JSON-lines detection log reader
//!
//! The external detector+tracker writes one header line followed by one
//! record per frame:
//!
//! ```text
//! {"fps":30.0,"width":1280,"height":720}
//! {"frame":0,"detections":[{"bbox":[10,20,110,90],"class_id":2,"confidence":0.91,"track_id":5}]}
//! {"frame":1,"decoded":false}
//! ```
//!
//! Boxes are in source pixels and are rescaled to the processed size here.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::detection::{BoundingBox, DetectionBatch, RawDetection};
use crate::frame;
use crate::{FrameSource, SourceError, SourceMetadata};

#[derive(Debug, Deserialize)]
struct FrameRecord {
    frame: u64,
    #[serde(default = "default_decoded")]
    decoded: bool,
    #[serde(default)]
    detections: Vec<DetectionRecord>,
}

fn default_decoded() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DetectionRecord {
    bbox: [f32; 4],
    class_id: u32,
    confidence: f32,
    #[serde(default)]
    track_id: Option<u32>,
}

/// Detection batches read from a JSON-lines log
pub struct JsonlSource<R: BufRead = BufReader<File>> {
    lines: Lines<R>,
    line_no: usize,
    metadata: SourceMetadata,
    target_width: u32,
    target_height: u32,
    scale_x: f32,
    scale_y: f32,
    frames_dir: Option<PathBuf>,
    next_index: u64,
    pending: Option<FrameRecord>,
}

impl JsonlSource {
    /// Open a detection log, rescaling boxes to `target_width x target_height`
    pub fn open(path: &Path, target_width: u32, target_height: u32) -> Result<Self, SourceError> {
        let file = File::open(path)
            .map_err(|e| SourceError::Open(format!("{}: {}", path.display(), e)))?;
        info!("Opened detection log {}", path.display());
        Self::from_reader(BufReader::new(file), target_width, target_height)
    }
}

impl<R: BufRead> JsonlSource<R> {
    /// Read from any buffered reader; the header line is consumed immediately
    pub fn from_reader(reader: R, target_width: u32, target_height: u32) -> Result<Self, SourceError> {
        if target_width == 0 || target_height == 0 {
            return Err(SourceError::Open(format!(
                "target size must be positive, got {}x{}",
                target_width, target_height
            )));
        }

        let mut source = Self {
            lines: reader.lines(),
            line_no: 0,
            metadata: SourceMetadata { fps: 0.0, width: 0, height: 0 },
            target_width,
            target_height,
            scale_x: 1.0,
            scale_y: 1.0,
            frames_dir: None,
            next_index: 0,
            pending: None,
        };

        let header = source
            .next_line()?
            .ok_or_else(|| SourceError::Open("detection log is empty".to_string()))?;
        let metadata: SourceMetadata = serde_json::from_str(&header).map_err(|e| SourceError::Parse {
            line: source.line_no,
            message: e.to_string(),
        })?;
        if metadata.width == 0 || metadata.height == 0 {
            return Err(SourceError::Open(format!(
                "source dimensions must be positive, got {}x{}",
                metadata.width, metadata.height
            )));
        }

        source.scale_x = target_width as f32 / metadata.width as f32;
        source.scale_y = target_height as f32 / metadata.height as f32;
        source.metadata = metadata;
        debug!(
            "Source {}x{} @ {} fps, scale ({:.3}, {:.3})",
            metadata.width, metadata.height, metadata.fps, source.scale_x, source.scale_y
        );

        Ok(source)
    }

    /// Load frame images `frame_NNNNNN.{png,jpg}` from a directory
    pub fn with_frames_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.frames_dir = Some(dir.into());
        self
    }

    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn next_record(&mut self) -> Result<Option<FrameRecord>, SourceError> {
        if let Some(record) = self.pending.take() {
            return Ok(Some(record));
        }
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        serde_json::from_str(&line)
            .map(Some)
            .map_err(|e| SourceError::Parse {
                line: self.line_no,
                message: e.to_string(),
            })
    }

    fn load_frame(&self, index: u64) -> Option<RgbImage> {
        let dir = self.frames_dir.as_ref()?;
        let path = ["png", "jpg"]
            .iter()
            .map(|ext| dir.join(format!("frame_{:06}.{}", index, ext)))
            .find(|p| p.exists())?;

        match frame::load(&path) {
            Ok(img) => Some(frame::fit(img, self.target_width, self.target_height)),
            Err(e) => {
                warn!("Frame {} image unreadable ({}), annotating blank canvas", index, e);
                None
            }
        }
    }

    fn to_batch(&self, record: FrameRecord) -> DetectionBatch {
        if !record.decoded {
            return DetectionBatch::gap(record.frame);
        }

        let detections = record
            .detections
            .into_iter()
            .map(|d| RawDetection {
                bbox: BoundingBox::from_scaled(d.bbox, self.scale_x, self.scale_y),
                class_id: d.class_id,
                confidence: d.confidence,
                track_id: d.track_id,
            })
            .collect();

        let batch = DetectionBatch::new(record.frame, detections);
        match self.load_frame(record.frame) {
            Some(frame) => batch.with_frame(frame),
            None => batch,
        }
    }
}

impl<R: BufRead> FrameSource for JsonlSource<R> {
    fn metadata(&self) -> SourceMetadata {
        self.metadata
    }

    fn next_batch(&mut self) -> Result<Option<DetectionBatch>, SourceError> {
        let Some(record) = self.next_record()? else {
            return Ok(None);
        };

        let index = self.next_index;
        if record.frame < index {
            return Err(SourceError::Parse {
                line: self.line_no,
                message: format!("frame {} arrived after frame {}", record.frame, index - 1),
            });
        }

        self.next_index += 1;
        if record.frame > index {
            // Frames missing from the log are decode gaps
            warn!("Frame {} missing from detection log", index);
            self.pending = Some(record);
            return Ok(Some(DetectionBatch::gap(index)));
        }

        Ok(Some(self.to_batch(record)))
    }
}
