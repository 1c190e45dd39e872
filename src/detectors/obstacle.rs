//! Obstacle detection
//!
//! Column sweep of the under-horizon region: columns holding enough
//! team-colored or white pixels are merged into bounding boxes, each tagged
//! with the dominant team color or left unclassified.

use super::{ColorClassifier, Horizon, HsvColorClassifier, ObstacleDetector};
use crate::candidate::{Obstacle, ObstacleColor};
use crate::config::ObstacleConfig;
use crate::error::VisionError;
use crate::frame::Frame;
use tracing::debug;

// Fraction of matched pixels a team color needs to claim an obstacle.
const COLOR_DOMINANCE: f32 = 0.3;

const OBSTACLE_CONFIDENCE: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
struct ColumnHit {
    x: u32,
    y_min: u32,
    y_max: u32,
    total: u32,
    magenta: u32,
    cyan: u32,
}

/// Color-segmentation obstacle detector.
pub struct ColorObstacleDetector {
    magenta: HsvColorClassifier,
    cyan: HsvColorClassifier,
    white: HsvColorClassifier,
    scan_stride: u32,
    min_column_run: u32,
    min_width: u32,
}

impl ColorObstacleDetector {
    pub fn new(config: &ObstacleConfig) -> Self {
        Self {
            magenta: HsvColorClassifier::new(config.magenta),
            cyan: HsvColorClassifier::new(config.cyan),
            white: HsvColorClassifier::new(config.white),
            scan_stride: config.scan_stride.max(1),
            min_column_run: config.min_column_run,
            min_width: config.min_width,
        }
    }

    fn scan_column(&self, frame: &Frame, horizon: &Horizon, x: u32) -> Option<ColumnHit> {
        let mut hit: Option<ColumnHit> = None;
        for y in horizon.y_at(x)..frame.height() {
            let rgb = frame.rgb(x, y);
            let is_magenta = self.magenta.matches(rgb);
            let is_cyan = self.cyan.matches(rgb);
            if !(is_magenta || is_cyan || self.white.matches(rgb)) {
                continue;
            }
            let entry = hit.get_or_insert(ColumnHit {
                x,
                y_min: y,
                y_max: y,
                total: 0,
                magenta: 0,
                cyan: 0,
            });
            entry.y_max = y;
            entry.total += 1;
            if is_magenta {
                entry.magenta += 1;
            }
            if is_cyan {
                entry.cyan += 1;
            }
        }
        hit.filter(|h| h.total >= self.min_column_run)
    }

    fn merge(&self, hits: &[ColumnHit]) -> Vec<Obstacle> {
        let mut obstacles = Vec::new();
        let mut run: Vec<ColumnHit> = Vec::new();

        let flush = |run: &mut Vec<ColumnHit>, out: &mut Vec<Obstacle>| {
            if run.is_empty() {
                return;
            }
            let x0 = run[0].x;
            let x1 = run[run.len() - 1].x;
            let width = x1 - x0 + 1;
            if width >= self.min_width {
                let y0 = run.iter().map(|h| h.y_min).min().unwrap_or(0);
                let y1 = run.iter().map(|h| h.y_max).max().unwrap_or(y0);
                let total: u32 = run.iter().map(|h| h.total).sum();
                let magenta: u32 = run.iter().map(|h| h.magenta).sum();
                let cyan: u32 = run.iter().map(|h| h.cyan).sum();
                let color = if total > 0 && magenta as f32 >= COLOR_DOMINANCE * total as f32 {
                    ObstacleColor::Magenta
                } else if total > 0 && cyan as f32 >= COLOR_DOMINANCE * total as f32 {
                    ObstacleColor::Cyan
                } else {
                    ObstacleColor::Unclassified
                };
                out.push(Obstacle {
                    x: x0,
                    y: y0,
                    width,
                    height: y1 - y0 + 1,
                    color,
                    confidence: OBSTACLE_CONFIDENCE,
                });
            }
            run.clear();
        };

        for &hit in hits {
            if let Some(&last) = run.last() {
                if hit.x - last.x > self.scan_stride {
                    flush(&mut run, &mut obstacles);
                }
            }
            run.push(hit);
        }
        flush(&mut run, &mut obstacles);
        obstacles
    }
}

impl ObstacleDetector for ColorObstacleDetector {
    fn detect(&self, frame: &Frame, horizon: &Horizon) -> Result<Vec<Obstacle>, VisionError> {
        let mut hits = Vec::new();
        let mut x = 0;
        while x < frame.width() {
            if let Some(hit) = self.scan_column(frame, horizon, x) {
                hits.push(hit);
            }
            x += self.scan_stride;
        }
        let obstacles = self.merge(&hits);
        debug!(count = obstacles.len(), "Obstacles segmented");
        Ok(obstacles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisionConfig;

    fn detector() -> ColorObstacleDetector {
        ColorObstacleDetector::new(&VisionConfig::default().obstacle)
    }

    /// Green field frame with a colored block at (x0, y0)..(x0+w, y0+h).
    fn frame_with_block(rgb: [u8; 3], x0: u32, y0: u32, w: u32, h: u32) -> Frame {
        let (width, height) = (64u32, 64u32);
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
                    data.extend_from_slice(&rgb);
                } else {
                    data.extend_from_slice(&[0, 180, 0]);
                }
            }
        }
        Frame::new(0, 0, width, height, data).unwrap()
    }

    #[test]
    fn test_magenta_obstacle_detected() {
        let frame = frame_with_block([220, 30, 220], 20, 20, 12, 20);
        let horizon = Horizon::flat(10, 64, 64);
        let obstacles = detector().detect(&frame, &horizon).unwrap();
        assert_eq!(obstacles.len(), 1);
        let o = &obstacles[0];
        assert_eq!(o.color, ObstacleColor::Magenta);
        assert!(o.x >= 20 && o.x < 24);
        assert_eq!(o.y, 20);
        assert!(o.width >= 8 && o.width <= 12);
        assert_eq!(o.height, 20);
        assert_eq!(o.confidence, 1.0);
    }

    #[test]
    fn test_cyan_obstacle_detected() {
        let frame = frame_with_block([30, 200, 220], 20, 20, 12, 20);
        let horizon = Horizon::flat(10, 64, 64);
        let obstacles = detector().detect(&frame, &horizon).unwrap();
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].color, ObstacleColor::Cyan);
    }

    #[test]
    fn test_white_obstacle_unclassified() {
        let frame = frame_with_block([240, 240, 240], 20, 20, 12, 20);
        let horizon = Horizon::flat(10, 64, 64);
        let obstacles = detector().detect(&frame, &horizon).unwrap();
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].color, ObstacleColor::Unclassified);
    }

    #[test]
    fn test_block_above_horizon_ignored() {
        let frame = frame_with_block([220, 30, 220], 20, 2, 12, 6);
        let horizon = Horizon::flat(20, 64, 64);
        let obstacles = detector().detect(&frame, &horizon).unwrap();
        assert!(obstacles.is_empty());
    }

    #[test]
    fn test_empty_field_no_obstacles() {
        let frame = frame_with_block([0, 180, 0], 0, 0, 1, 1);
        let horizon = Horizon::flat(0, 64, 64);
        let obstacles = detector().detect(&frame, &horizon).unwrap();
        assert!(obstacles.is_empty());
    }

    #[test]
    fn test_two_separated_obstacles() {
        let (width, height) = (64u32, 64u32);
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let in_a = x >= 8 && x < 16 && y >= 20 && y < 40;
                let in_b = x >= 44 && x < 52 && y >= 20 && y < 40;
                if in_a {
                    data.extend_from_slice(&[220, 30, 220]);
                } else if in_b {
                    data.extend_from_slice(&[30, 200, 220]);
                } else {
                    data.extend_from_slice(&[0, 180, 0]);
                }
            }
        }
        let frame = Frame::new(0, 0, width, height, data).unwrap();
        let horizon = Horizon::flat(10, 64, 64);
        let obstacles = detector().detect(&frame, &horizon).unwrap();
        assert_eq!(obstacles.len(), 2);
        assert_eq!(obstacles[0].color, ObstacleColor::Magenta);
        assert_eq!(obstacles[1].color, ObstacleColor::Cyan);
    }
}
