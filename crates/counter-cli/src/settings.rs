//! Session settings
//!
//! Resolved once before the session starts, in layers: built-in defaults,
//! an optional TOML file, `LANE_COUNTER_*` environment variables, then
//! command-line flags.

use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};

use lane_counter::{ClassCatalog, CounterConfig, LanePolicy};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "LANE_COUNTER";

/// Settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Detection log written by the detector/tracker
    pub source: Option<PathBuf>,

    /// Directory of decoded frame images
    pub frames_dir: Option<PathBuf>,

    /// Directory for annotated frames (no annotation when unset)
    pub output_video: Option<PathBuf>,

    /// CSV count event log
    pub output_log: PathBuf,

    /// Processed frame size
    pub target_width: u32,
    pub target_height: u32,

    /// Frame rate used when the source reports none
    pub fps_fallback: f64,

    /// Vehicle class names
    pub vehicle_classes: Vec<String>,
    pub confidence_threshold: f32,
    pub lane_count: usize,
    pub lane_policy: LanePolicy,

    pub log_level: String,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let counter = CounterConfig::default();
        Self {
            source: None,
            frames_dir: None,
            output_video: Some(PathBuf::from("traffic_output/annotated")),
            output_log: PathBuf::from("traffic_output/counts.csv"),
            target_width: 640,
            target_height: 360,
            fps_fallback: 30.0,
            vehicle_classes: counter.vehicle_classes,
            confidence_threshold: counter.confidence_threshold,
            lane_count: counter.lane_count,
            lane_policy: counter.lane_policy,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Load defaults, then `path` (if any), then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::build(path, None)
    }

    fn build(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("vehicle_classes")
                .source(env),
        );

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn counter_config(&self) -> CounterConfig {
        CounterConfig {
            vehicle_classes: self.vehicle_classes.clone(),
            confidence_threshold: self.confidence_threshold,
            lane_count: self.lane_count,
            lane_policy: self.lane_policy,
        }
    }

    /// Reject settings that would make the session meaningless
    pub fn validate(&self, catalog: &ClassCatalog) -> Result<()> {
        if self.source.is_none() {
            bail!("No source detection log configured");
        }
        if self.target_width == 0 || self.target_height == 0 {
            bail!(
                "Target frame size must be positive, got {}x{}",
                self.target_width,
                self.target_height
            );
        }
        if !(self.fps_fallback.is_finite() && self.fps_fallback > 0.0) {
            bail!("Fallback frame rate must be positive, got {}", self.fps_fallback);
        }

        let counter = self.counter_config();
        counter.validate()?;
        catalog.resolve(counter.vehicle_classes.as_slice())?;
        Ok(())
    }
}
