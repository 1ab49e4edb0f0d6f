//! Counter configuration

use serde::{Deserialize, Serialize};
use crate::CounterError;

/// Which lanes a single track may be counted in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanePolicy {
    /// Once per lane the track is ever assigned to
    #[default]
    PerLane,
    /// Only in the first lane the track is ever assigned to
    FirstLaneOnly,
}

/// Counter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Detector class names that count as vehicles
    pub vehicle_classes: Vec<String>,

    /// Minimum detection confidence
    pub confidence_threshold: f32,

    /// Number of equal-width lanes
    pub lane_count: usize,

    /// Cross-lane counting policy
    pub lane_policy: LanePolicy,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            vehicle_classes: ["car", "motorcycle", "bus", "truck"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            confidence_threshold: 0.25,
            lane_count: 3,
            lane_policy: LanePolicy::PerLane,
        }
    }
}

impl CounterConfig {
    pub fn validate(&self) -> Result<(), CounterError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CounterError::InvalidConfiguration(format!(
                "confidence threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if self.lane_count == 0 {
            return Err(CounterError::InvalidConfiguration(
                "lane count must be at least 1".to_string(),
            ));
        }
        if self.vehicle_classes.is_empty() {
            return Err(CounterError::InvalidConfiguration(
                "no vehicle classes configured".to_string(),
            ));
        }
        Ok(())
    }
}
