//! Lane Geometry
//!
//! Fixed lane layout for a traffic camera frame:
//! - Equal-width vertical lane regions spanning the full frame height
//! - Boundary-inclusive point-in-polygon containment
//! - First-match lane resolution in left-to-right order

pub mod classify;
pub mod region;

pub use classify::{classify, point_in_polygon};
pub use region::{define_lanes, FrameDimensions, LaneRegion, Point};

use thiserror::Error;

/// Geometry error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
