//! Counting session
//!
//! Frames are read on a blocking producer and handed over a bounded channel
//! to a single consumer that counts them strictly in arrival order. A
//! shutdown request is honored between frames; everything written up to
//! that point stays valid.

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use event_log::{CsvEventLog, ReportingSink, SessionSummary};
use frame_source::{DetectionBatch, FrameSource, JsonlSource, SourceError};
use lane_counter::{ClassCatalog, LaneCounter};
use lane_geometry::FrameDimensions;
use overlay::{AnnotatedFrameWriter, FrameAnnotator};

use crate::settings::Settings;

/// Batches buffered between producer and counter
const CHANNEL_DEPTH: usize = 8;

type BoxedSource = Box<dyn FrameSource + Send>;

/// A configured session, ready to run once
pub struct Session {
    source: BoxedSource,
    counter: LaneCounter,
    reporting: ReportingSink<CsvEventLog>,
    annotator: Option<(FrameAnnotator, AnnotatedFrameWriter)>,
}

impl Session {
    /// Open the configured detection log and build a session around it
    pub fn open(settings: &Settings) -> Result<Self> {
        let path = settings
            .source
            .as_deref()
            .context("No source detection log configured")?;
        let mut source = JsonlSource::open(path, settings.target_width, settings.target_height)
            .with_context(|| format!("Cannot open source {}", path.display()))?;
        if let Some(dir) = &settings.frames_dir {
            source = source.with_frames_dir(dir);
        }

        Self::with_source(settings, &ClassCatalog::coco(), Box::new(source))
    }

    /// Build a session over any frame source
    pub fn with_source(settings: &Settings, catalog: &ClassCatalog, source: BoxedSource) -> Result<Self> {
        settings.validate(catalog)?;
        let dims = FrameDimensions::new(settings.target_width, settings.target_height)?;
        let fps = source.metadata().fps_or(settings.fps_fallback);

        let counter = LaneCounter::new(&settings.counter_config(), catalog, dims, fps)?;
        info!(
            "Session: {}x{} @ {:.2} fps, lanes {:?}",
            dims.width,
            dims.height,
            fps,
            counter
                .engine()
                .lanes()
                .iter()
                .map(|l| l.x_span())
                .collect::<Vec<_>>()
        );

        // Outputs are created only once the configuration is known to be good.
        // The event log comes last so a failed setup never leaves a header-only file.
        let annotator = match &settings.output_video {
            Some(dir) => {
                let writer = AnnotatedFrameWriter::create(dir)
                    .with_context(|| format!("Cannot open annotated output {}", dir.display()))?;
                let lanes = counter.engine().lanes().to_vec();
                Some((FrameAnnotator::new(dims, lanes), writer))
            }
            None => None,
        };

        if let Some(parent) = settings.output_log.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Cannot create {}", parent.display()))?;
            }
        }
        let log = CsvEventLog::create(&settings.output_log)
            .with_context(|| format!("Cannot open event log {}", settings.output_log.display()))?;
        let reporting = ReportingSink::new(log, settings.lane_count);

        Ok(Self {
            source,
            counter,
            reporting,
            annotator,
        })
    }

    /// Process the stream to its end or until `shutdown` turns true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<SessionSummary> {
        let Session {
            source,
            mut counter,
            mut reporting,
            mut annotator,
        } = self;

        let (tx, mut rx) = mpsc::channel::<Result<DetectionBatch, SourceError>>(CHANNEL_DEPTH);
        let producer = tokio::task::spawn_blocking(move || produce(source, tx));

        let mut interrupted = false;
        let mut shutdown_open = true;

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed(), if shutdown_open => match changed {
                    Ok(()) if *shutdown.borrow() => {
                        warn!("Shutdown requested, stopping at frame boundary");
                        interrupted = true;
                        break;
                    }
                    Ok(()) => {}
                    Err(_) => shutdown_open = false,
                },

                msg = rx.recv() => match msg {
                    Some(Ok(mut batch)) => {
                        let frame = batch.frame.take();
                        let outcome = counter.process(&batch)?;
                        reporting.record(&outcome).context("Failed to append count events")?;

                        if !outcome.decoded {
                            warn!("Frame {} could not be decoded, skipped", outcome.frame_index);
                            continue;
                        }
                        if let Some((renderer, writer)) = annotator.as_mut() {
                            let img = renderer.annotate(frame, &outcome, reporting.lane_counts());
                            writer
                                .write(outcome.frame_index, &img)
                                .context("Failed to write annotated frame")?;
                        }
                    }
                    Some(Err(e)) => return Err(e).context("Detection stream failed"),
                    None => break,
                },
            }
        }

        drop(rx);
        if let Err(e) = producer.await {
            warn!("Frame producer ended abnormally: {}", e);
        }

        let events_logged = reporting.events_written();
        let log = reporting.finish().context("Failed to close event log")?;
        info!("{} count events written to {}", log.rows(), log.path().display());

        let summary = SessionSummary::new(counter.summary(), events_logged, interrupted);
        info!(
            "Session finished: {} vehicles over {} frames",
            summary.counts.total, summary.counts.frames_processed
        );
        Ok(summary)
    }
}

fn produce(mut source: BoxedSource, tx: mpsc::Sender<Result<DetectionBatch, SourceError>>) {
    loop {
        let next = match source.next_batch() {
            Ok(Some(batch)) => Ok(batch),
            Ok(None) => return,
            Err(e) => Err(e),
        };
        let failed = next.is_err();
        if tx.blocking_send(next).is_err() || failed {
            return;
        }
    }
}

/// Open the configured source and run a session to completion
pub async fn run_session(settings: &Settings, shutdown: watch::Receiver<bool>) -> Result<SessionSummary> {
    Session::open(settings)?.run(shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_source::{BoundingBox, RawDetection, SourceMetadata, VecSource};
    use std::path::PathBuf;

    fn car(track_id: u32, cx: i32) -> RawDetection {
        RawDetection {
            bbox: BoundingBox::new(cx - 20, 80, cx + 20, 120),
            class_id: 2,
            confidence: 0.9,
            track_id: Some(track_id),
        }
    }

    fn settings(dir: &std::path::Path) -> Settings {
        Settings {
            source: Some(PathBuf::from("unused.jsonl")),
            output_video: Some(dir.join("annotated")),
            output_log: dir.join("out").join("counts.csv"),
            target_width: 900,
            target_height: 360,
            ..Default::default()
        }
    }

    fn source(batches: Vec<DetectionBatch>) -> BoxedSource {
        Box::new(VecSource::new(
            SourceMetadata {
                fps: 30.0,
                width: 900,
                height: 360,
            },
            batches,
        ))
    }

    #[tokio::test]
    async fn test_session_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());

        let batches = vec![
            DetectionBatch::new(0, vec![car(5, 310)]),
            DetectionBatch::new(1, vec![]),
            DetectionBatch::gap(2),
            DetectionBatch::new(3, vec![car(5, 320), car(6, 700)]),
        ];
        let session = Session::with_source(&settings, &ClassCatalog::coco(), source(batches)).unwrap();

        let (_tx, rx) = watch::channel(false);
        let summary = session.run(rx).await.unwrap();

        assert_eq!(summary.counts.lane_counts, vec![0, 1, 1]);
        assert_eq!(summary.counts.total, 2);
        assert_eq!(summary.counts.frames_processed, 4);
        assert_eq!(summary.counts.decode_gaps, 1);
        assert!(!summary.interrupted);

        let csv = std::fs::read_to_string(&settings.output_log).unwrap();
        assert_eq!(
            csv,
            "track_id,lane,frame_index,timestamp_sec\n5,2,0,0.00\n6,3,3,0.10\n"
        );

        let annotated = dir.path().join("annotated");
        assert!(annotated.join("frame_000000.png").exists());
        assert!(annotated.join("frame_000001.png").exists());
        assert!(!annotated.join("frame_000002.png").exists());
        assert!(annotated.join("frame_000003.png").exists());
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let batches = (0..50).map(|i| DetectionBatch::new(i, vec![car(1, 100)])).collect();
        let session = Session::with_source(&settings, &ClassCatalog::coco(), source(batches)).unwrap();

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let summary = session.run(rx).await.unwrap();

        assert!(summary.interrupted);
        assert!(summary.counts.frames_processed < 50);
        let csv = std::fs::read_to_string(&settings.output_log).unwrap();
        assert!(csv.starts_with("track_id,lane,frame_index,timestamp_sec\n"));
    }

    #[tokio::test]
    async fn test_missing_source_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.source = Some(dir.path().join("missing.jsonl"));

        assert!(Session::open(&settings).is_err());
        // No partial output
        assert!(!settings.output_log.exists());
    }

    #[tokio::test]
    async fn test_unusable_annotation_dir_leaves_no_event_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        let blocker = dir.path().join("annotated.png");
        std::fs::write(&blocker, b"not a directory").unwrap();
        settings.output_video = Some(blocker);

        assert!(Session::with_source(&settings, &ClassCatalog::coco(), source(vec![])).is_err());
        assert!(!settings.output_log.exists());
    }

    #[tokio::test]
    async fn test_open_rejects_bad_configuration_before_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("detections.jsonl");
        std::fs::write(&log_path, "{\"fps\":10.0,\"width\":900,\"height\":360}\n").unwrap();

        let mut settings = settings(dir.path());
        settings.source = Some(log_path);
        settings.lane_count = 0;

        let err = Session::open(&settings).err().expect("lane count 0 rejected");
        assert!(format!("{:#}", err).contains("lane"));
        assert!(!settings.output_log.exists());
        assert!(!dir.path().join("annotated").exists());
    }

    #[tokio::test]
    async fn test_run_session_from_detection_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("detections.jsonl");
        std::fs::write(
            &log_path,
            concat!(
                "{\"fps\":10.0,\"width\":1800,\"height\":720}\n",
                "{\"frame\":0,\"detections\":[{\"bbox\":[600,160,640,240],\"class_id\":7,\"confidence\":0.8,\"track_id\":11}]}\n",
                "{\"frame\":1,\"detections\":[{\"bbox\":[0,0,40,40],\"class_id\":0,\"confidence\":0.99,\"track_id\":12}]}\n",
            ),
        )
        .unwrap();

        let mut settings = settings(dir.path());
        settings.source = Some(log_path);
        settings.output_video = None;

        let (_tx, rx) = watch::channel(false);
        let summary = run_session(&settings, rx).await.unwrap();

        // Box scaled by 0.5 -> centroid x = 310, lane 2
        assert_eq!(summary.counts.lane_counts, vec![0, 1, 0]);
        assert_eq!(summary.events_logged, 1);
        assert!(!dir.path().join("annotated").exists());
    }
}
