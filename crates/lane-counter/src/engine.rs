//! Lane counting engine
//!
//! Consumes observation batches in frame order and keeps, per lane, the set
//! of track ids already counted there. A track id is counted the first time
//! its centroid lands in a lane and never again in that lane. Counts only
//! grow; nothing is ever uncounted.

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lane_geometry::{classify, define_lanes, FrameDimensions, LaneRegion};
use crate::config::LanePolicy;
use crate::observation::Observation;
use crate::CounterError;

/// Counting state for one lane
#[derive(Debug, Clone, Default)]
pub struct LaneState {
    counted_ids: HashSet<u32>,
    running_count: u64,
}

impl LaneState {
    /// Count `track_id` if it is new to this lane
    fn count(&mut self, track_id: u32) -> bool {
        if !self.counted_ids.insert(track_id) {
            return false;
        }
        self.running_count += 1;
        true
    }

    pub fn running_count(&self) -> u64 {
        self.running_count
    }
}

/// Durable record of a track's first assignment to a lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountEvent {
    pub track_id: u32,
    /// One-based lane number
    pub lane: usize,
    pub frame_index: u64,
    pub timestamp_sec: f64,
}

/// Observation paired with the lane its centroid resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedObservation {
    pub observation: Observation,
    /// Zero-based lane index
    pub lane: Option<usize>,
}

/// Result of counting one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub frame_index: u64,
    /// False for decode gaps
    pub decoded: bool,
    pub observations: Vec<AssignedObservation>,
    pub events: Vec<CountEvent>,
    /// Per-lane counts after this frame
    pub lane_counts: Vec<u64>,
}

/// Final (or partial) session totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountSummary {
    pub lane_counts: Vec<u64>,
    pub total: u64,
    pub frames_processed: u64,
    pub decode_gaps: u64,
}

/// Stateful per-lane counter
pub struct LaneCountingEngine {
    lanes: Vec<LaneRegion>,
    states: Vec<LaneState>,
    policy: LanePolicy,
    fps: f64,
    /// Tracks counted in any lane (FirstLaneOnly)
    counted_anywhere: HashSet<u32>,
    last_frame: Option<u64>,
    frames_processed: u64,
    decode_gaps: u64,
}

impl LaneCountingEngine {
    /// Build lanes for `dims` and start with every lane empty
    pub fn new(
        dims: FrameDimensions,
        lane_count: usize,
        policy: LanePolicy,
        fps: f64,
    ) -> Result<Self, CounterError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(CounterError::InvalidConfiguration(format!(
                "frame rate must be positive, got {}",
                fps
            )));
        }

        let lanes = define_lanes(dims, lane_count)?;
        info!(
            "Lane counting engine: {} lanes over {}x{}, policy {:?}",
            lanes.len(),
            dims.width,
            dims.height,
            policy
        );

        Ok(Self {
            states: vec![LaneState::default(); lanes.len()],
            lanes,
            policy,
            fps,
            counted_anywhere: HashSet::new(),
            last_frame: None,
            frames_processed: 0,
            decode_gaps: 0,
        })
    }

    pub fn lanes(&self) -> &[LaneRegion] {
        &self.lanes
    }

    pub fn lane_states(&self) -> &[LaneState] {
        &self.states
    }

    pub fn lane_counts(&self) -> Vec<u64> {
        self.lane_states().iter().map(LaneState::running_count).collect()
    }

    pub fn total(&self) -> u64 {
        self.lane_states().iter().map(LaneState::running_count).sum()
    }

    /// Seconds from stream start for `frame_index`
    pub fn timestamp_sec(&self, frame_index: u64) -> f64 {
        frame_index as f64 / self.fps
    }

    fn advance(&mut self, frame_index: u64) -> Result<(), CounterError> {
        if let Some(last) = self.last_frame {
            if frame_index <= last {
                return Err(CounterError::OutOfOrder {
                    last,
                    got: frame_index,
                });
            }
        }
        self.last_frame = Some(frame_index);
        self.frames_processed += 1;
        Ok(())
    }

    /// Apply one frame's observations.
    ///
    /// Frames must arrive in strictly increasing order. Observations without a
    /// track id, or whose centroid falls outside every lane, are returned for
    /// rendering but never counted.
    pub fn process_frame(
        &mut self,
        frame_index: u64,
        observations: Vec<Observation>,
    ) -> Result<FrameOutcome, CounterError> {
        self.advance(frame_index)?;

        let timestamp_sec = self.timestamp_sec(frame_index);
        let mut events = Vec::new();
        let mut assigned = Vec::with_capacity(observations.len());

        for observation in observations {
            let lane = classify(observation.centroid, &self.lanes);

            if let (Some(lane_idx), Some(track_id)) = (lane, observation.track_id) {
                if self.try_count(lane_idx, track_id) {
                    let event = CountEvent {
                        track_id,
                        lane: lane_idx + 1,
                        frame_index,
                        timestamp_sec,
                    };
                    info!(
                        "Counted track {} in lane {} at frame {} ({:.2}s)",
                        track_id, event.lane, frame_index, timestamp_sec
                    );
                    events.push(event);
                }
            }

            assigned.push(AssignedObservation { observation, lane });
        }

        debug!(
            "Frame {}: {} observations, {} new counts",
            frame_index,
            assigned.len(),
            events.len()
        );

        Ok(FrameOutcome {
            frame_index,
            decoded: true,
            observations: assigned,
            events,
            lane_counts: self.lane_counts(),
        })
    }

    fn try_count(&mut self, lane_idx: usize, track_id: u32) -> bool {
        if self.policy == LanePolicy::FirstLaneOnly && self.counted_anywhere.contains(&track_id) {
            return false;
        }
        let counted = self.states[lane_idx].count(track_id);
        if counted {
            self.counted_anywhere.insert(track_id);
        }
        counted
    }

    /// Advance past a frame that could not be decoded; state is untouched
    pub fn record_gap(&mut self, frame_index: u64) -> Result<FrameOutcome, CounterError> {
        self.advance(frame_index)?;
        self.decode_gaps += 1;

        Ok(FrameOutcome {
            frame_index,
            decoded: false,
            observations: Vec::new(),
            events: Vec::new(),
            lane_counts: self.lane_counts(),
        })
    }

    pub fn summary(&self) -> CountSummary {
        CountSummary {
            lane_counts: self.lane_counts(),
            total: self.total(),
            frames_processed: self.frames_processed,
            decode_gaps: self.decode_gaps,
        }
    }
}
