//! Lane regions

use serde::{Deserialize, Serialize};
use crate::GeometryError;

/// Integer pixel coordinate in the processed frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Processed frame size, fixed for the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    /// Create frame dimensions, rejecting zero sizes
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidConfiguration(format!(
                "frame dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }
}

/// One traffic lane: a closed polygon, vertices in drawing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneRegion {
    /// Zero-based lane index, left to right
    pub index: usize,

    /// Polygon vertices (closed implicitly, last connects to first)
    pub vertices: Vec<Point>,
}

impl LaneRegion {
    /// One-based lane number used in logs and overlays
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Horizontal extent `(min_x, max_x)` of the polygon
    pub fn x_span(&self) -> (i32, i32) {
        let min = self.vertices.iter().map(|p| p.x).min().unwrap_or(0);
        let max = self.vertices.iter().map(|p| p.x).max().unwrap_or(0);
        (min, max)
    }
}

/// Split the frame width into `lane_count` equal vertical lanes.
///
/// Lane `i` spans `[i*w, (i+1)*w]` with `w = width / lane_count`. The
/// remainder of the integer division is not assigned to any lane, so pixels
/// at `x > lane_count * w` classify as no lane.
pub fn define_lanes(
    dims: FrameDimensions,
    lane_count: usize,
) -> Result<Vec<LaneRegion>, GeometryError> {
    if dims.width == 0 || dims.height == 0 {
        return Err(GeometryError::InvalidConfiguration(format!(
            "frame dimensions must be positive, got {}x{}",
            dims.width, dims.height
        )));
    }
    if lane_count == 0 {
        return Err(GeometryError::InvalidConfiguration(
            "lane count must be at least 1".to_string(),
        ));
    }
    if lane_count > dims.width as usize {
        return Err(GeometryError::InvalidConfiguration(format!(
            "{} lanes do not fit in a frame {} pixels wide",
            lane_count, dims.width
        )));
    }

    let lane_width = (dims.width as usize / lane_count) as i32;
    let height = dims.height as i32;

    Ok((0..lane_count)
        .map(|i| {
            let left = i as i32 * lane_width;
            let right = left + lane_width;
            LaneRegion {
                index: i,
                vertices: vec![
                    Point::new(left, 0),
                    Point::new(right, 0),
                    Point::new(right, height),
                    Point::new(left, height),
                ],
            }
        })
        .collect())
}
