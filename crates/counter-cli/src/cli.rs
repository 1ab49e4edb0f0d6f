//! Command-line arguments

use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, ValueEnum};

use lane_counter::LanePolicy;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    PerLane,
    FirstLaneOnly,
}

impl From<PolicyArg> for LanePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::PerLane => LanePolicy::PerLane,
            PolicyArg::FirstLaneOnly => LanePolicy::FirstLaneOnly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lane-counter")]
#[command(about = "Count tracked vehicles per lane from a detection log", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Detection log (JSON lines) from the detector/tracker
    #[arg(short, long, value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// Directory of decoded frames (frame_NNNNNN.png|jpg)
    #[arg(long, value_name = "DIR")]
    pub frames_dir: Option<PathBuf>,

    /// Directory for annotated frames
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_video: Option<PathBuf>,

    /// Skip annotated frame output
    #[arg(long, conflicts_with = "output_video")]
    pub no_video: bool,

    /// CSV count event log
    #[arg(short = 'l', long, value_name = "PATH")]
    pub output_log: Option<PathBuf>,

    /// Number of lanes
    #[arg(short = 'n', long)]
    pub lanes: Option<usize>,

    /// Processed frame width
    #[arg(long)]
    pub width: Option<u32>,

    /// Processed frame height
    #[arg(long)]
    pub height: Option<u32>,

    /// Minimum detection confidence
    #[arg(long)]
    pub confidence: Option<f32>,

    /// Vehicle class names, comma separated
    #[arg(long, value_delimiter = ',')]
    pub classes: Option<Vec<String>>,

    /// Cross-lane counting policy
    #[arg(long, value_enum)]
    pub lane_policy: Option<PolicyArg>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// JSON log output
    #[arg(long)]
    pub json_logs: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub summary_json: bool,
}

impl Args {
    /// Load layered settings and apply flags on top
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        self.apply(&mut settings);
        Ok(settings)
    }

    fn apply(&self, settings: &mut Settings) {
        if let Some(source) = &self.source {
            settings.source = Some(source.clone());
        }
        if let Some(dir) = &self.frames_dir {
            settings.frames_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.output_video {
            settings.output_video = Some(dir.clone());
        }
        if self.no_video {
            settings.output_video = None;
        }
        if let Some(path) = &self.output_log {
            settings.output_log = path.clone();
        }
        if let Some(lanes) = self.lanes {
            settings.lane_count = lanes;
        }
        if let Some(width) = self.width {
            settings.target_width = width;
        }
        if let Some(height) = self.height {
            settings.target_height = height;
        }
        if let Some(confidence) = self.confidence {
            settings.confidence_threshold = confidence;
        }
        if let Some(classes) = &self.classes {
            settings.vehicle_classes = classes.clone();
        }
        if let Some(policy) = self.lane_policy {
            settings.lane_policy = policy.into();
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if self.json_logs {
            settings.log_json = true;
        }
    }
}
