//! Field-line point extraction
//!
//! Samples a fixed grid under the horizon and keeps the white pixels. Points
//! are unordered within a frame; downstream localization treats them as a
//! cloud.

use super::{ColorClassifier, Horizon, HsvColorClassifier, LineDetector};
use crate::candidate::LinePoint;
use crate::config::LineConfig;
use crate::error::VisionError;
use crate::frame::Frame;

pub struct FieldLineDetector {
    white: HsvColorClassifier,
    sample_stride: u32,
}

impl FieldLineDetector {
    pub fn new(config: &LineConfig) -> Self {
        Self {
            white: HsvColorClassifier::new(config.white),
            sample_stride: config.sample_stride.max(1),
        }
    }
}

impl LineDetector for FieldLineDetector {
    fn detect(&self, frame: &Frame, horizon: &Horizon) -> Result<Vec<LinePoint>, VisionError> {
        let mut points = Vec::new();
        let mut y = horizon.min_y();
        while y < frame.height() {
            let mut x = 0;
            while x < frame.width() {
                if horizon.is_under(x, y, 0) && self.white.matches(frame.rgb(x, y)) {
                    points.push(LinePoint { x, y });
                }
                x += self.sample_stride;
            }
            y += self.sample_stride;
        }
        Ok(points)
    }
}
