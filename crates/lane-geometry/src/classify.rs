//! Point-region classification

use crate::region::{LaneRegion, Point};

/// Boundary-inclusive point-in-polygon test.
///
/// A point lying exactly on an edge or vertex counts as inside. Interior
/// points are resolved by ray casting with exact integer arithmetic
/// (i128, so products of full-range i32 differences cannot overflow).
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let px = i128::from(point.x);
    let py = i128::from(point.y);
    let mut inside = false;

    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        let (ax, ay) = (i128::from(a.x), i128::from(a.y));
        let (bx, by) = (i128::from(b.x), i128::from(b.y));

        if on_segment(px, py, ax, ay, bx, by) {
            return true;
        }

        // Half-open rule on y so shared vertices are crossed once
        if (ay > py) != (by > py) {
            let dy = by - ay;
            let lhs = (px - ax) * dy;
            let rhs = (py - ay) * (bx - ax);
            let crosses = if dy > 0 { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }
    }

    inside
}

fn on_segment(px: i128, py: i128, ax: i128, ay: i128, bx: i128, by: i128) -> bool {
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    cross == 0
        && px >= ax.min(bx)
        && px <= ax.max(bx)
        && py >= ay.min(by)
        && py <= ay.max(by)
}

/// Resolve a point to the first region containing it.
///
/// Regions are tested in the order given; on a boundary shared by two
/// adjoining lanes the lower-indexed lane wins.
pub fn classify(point: Point, regions: &[LaneRegion]) -> Option<usize> {
    regions
        .iter()
        .find(|region| point_in_polygon(point, &region.vertices))
        .map(|region| region.index)
}
