//! Frame annotation

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use frame_source::frame;
use lane_counter::{AssignedObservation, FrameOutcome};
use lane_geometry::{FrameDimensions, LaneRegion};
use crate::font::{draw_text, GLYPH_HEIGHT};

/// Overlay colors
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub lane: Rgb<u8>,
    pub detection: Rgb<u8>,
    pub centroid: Rgb<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            lane: Rgb([255, 255, 0]),
            detection: Rgb([0, 200, 0]),
            centroid: Rgb([255, 0, 0]),
        }
    }
}

/// Draws lanes, counts and detections onto processed frames
pub struct FrameAnnotator {
    dims: FrameDimensions,
    lanes: Vec<LaneRegion>,
    palette: Palette,
    text_scale: u32,
}

impl FrameAnnotator {
    pub fn new(dims: FrameDimensions, lanes: Vec<LaneRegion>) -> Self {
        Self {
            dims,
            lanes,
            palette: Palette::default(),
            text_scale: 2,
        }
    }

    /// Annotate one frame; a missing image is replaced by a black canvas
    pub fn annotate(
        &self,
        frame: Option<RgbImage>,
        outcome: &FrameOutcome,
        lane_counts: &[u64],
    ) -> RgbImage {
        let mut img = self.canvas(frame);

        self.draw_lanes(&mut img, lane_counts);
        for assigned in &outcome.observations {
            self.draw_observation(&mut img, assigned);
        }

        img
    }

    fn canvas(&self, source: Option<RgbImage>) -> RgbImage {
        let (w, h) = (self.dims.width, self.dims.height);
        match source {
            Some(img) => frame::fit(img, w, h),
            None => RgbImage::new(w, h),
        }
    }

    fn draw_lanes(&self, img: &mut RgbImage, lane_counts: &[u64]) {
        let color = self.palette.lane;

        for lane in &self.lanes {
            let vertices = &lane.vertices;
            for (i, a) in vertices.iter().enumerate() {
                let b = vertices[(i + 1) % vertices.len()];
                // 2 px outline
                for offset in [0.0, 1.0] {
                    draw_line_segment_mut(
                        img,
                        (a.x as f32 + offset, a.y as f32 + offset),
                        (b.x as f32 + offset, b.y as f32 + offset),
                        color,
                    );
                }
            }

            let count = lane_counts.get(lane.index).copied().unwrap_or(0);
            let baseline = 40 * lane.number() as i32;
            let top = baseline - GLYPH_HEIGHT * self.text_scale as i32;
            draw_text(
                img,
                &format!("Lane {}: {}", lane.number(), count),
                10,
                top,
                self.text_scale,
                color,
            );
        }
    }

    fn draw_observation(&self, img: &mut RgbImage, assigned: &AssignedObservation) {
        let obs = &assigned.observation;
        let bbox = obs.bbox;
        let color = self.palette.detection;

        let left = bbox.x1.min(bbox.x2);
        let top = bbox.y1.min(bbox.y2);
        let width = bbox.width().max(1);
        let height = bbox.height().max(1);
        for offset in 0..2 {
            let rect = Rect::at(left - offset, top - offset)
                .of_size(width + 2 * offset as u32, height + 2 * offset as u32);
            draw_hollow_rect_mut(img, rect, color);
        }

        let label = match obs.track_id {
            Some(id) => format!("id:{}", id),
            None => "id:?".to_string(),
        };
        let label_scale = (self.text_scale - 1).max(1);
        let baseline = (top - 7).max(20);
        draw_text(
            img,
            &label,
            left,
            baseline - GLYPH_HEIGHT * label_scale as i32,
            label_scale,
            color,
        );

        draw_filled_circle_mut(img, (obs.centroid.x, obs.centroid.y), 3, self.palette.centroid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_source::BoundingBox;
    use lane_counter::Observation;
    use lane_geometry::{define_lanes, Point};

    fn annotator() -> FrameAnnotator {
        let dims = FrameDimensions::new(300, 200).unwrap();
        FrameAnnotator::new(dims, define_lanes(dims, 3).unwrap())
    }

    fn outcome(observations: Vec<AssignedObservation>) -> FrameOutcome {
        FrameOutcome {
            frame_index: 0,
            decoded: true,
            observations,
            events: vec![],
            lane_counts: vec![0, 1, 0],
        }
    }

    #[test]
    fn test_blank_canvas_gets_lanes() {
        let img = annotator().annotate(None, &outcome(vec![]), &[0, 1, 0]);

        assert_eq!(img.dimensions(), (300, 200));
        // Shared boundary between lanes 1 and 2
        assert_eq!(*img.get_pixel(100, 150), Palette::default().lane);
        assert_eq!(*img.get_pixel(150, 150), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_detection_box_and_centroid() {
        let observation = Observation {
            track_id: Some(5),
            centroid: Point::new(150, 120),
            class_id: 2,
            bbox: BoundingBox::new(130, 100, 170, 140),
            frame_index: 0,
            timestamp_sec: 0.0,
        };
        let img = annotator().annotate(
            None,
            &outcome(vec![AssignedObservation {
                observation,
                lane: Some(1),
            }]),
            &[0, 1, 0],
        );

        let palette = Palette::default();
        assert_eq!(*img.get_pixel(150, 120), palette.centroid);
        assert_eq!(*img.get_pixel(130, 130), palette.detection);
        assert_eq!(*img.get_pixel(160, 110), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_source_frame_is_resized() {
        let frame = RgbImage::from_pixel(30, 20, Rgb([10, 10, 10]));
        let img = annotator().annotate(Some(frame), &outcome(vec![]), &[0, 0, 0]);

        assert_eq!(img.dimensions(), (300, 200));
        assert_eq!(*img.get_pixel(150, 150), Rgb([10, 10, 10]));
    }
}
