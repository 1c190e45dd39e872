//! Detection result types and the per-frame measurement event

use crate::frame::HeatmapCrop;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Provisional ball detection: a region of interest with a rating in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub center_x: u32,
    pub center_y: u32,
    pub diameter: u32,
    pub rating: f32,
}

impl Candidate {
    /// Deterministic total order used for top-candidate selection: higher
    /// rating first, then larger diameter, then smaller y, then smaller x.
    pub fn cmp_rating(&self, other: &Self) -> Ordering {
        self.rating
            .partial_cmp(&other.rating)
            .unwrap_or(Ordering::Equal)
            .then(self.diameter.cmp(&other.diameter))
            .then(other.center_y.cmp(&self.center_y))
            .then(other.center_x.cmp(&self.center_x))
    }

    /// The highest-rated candidate under [`Candidate::cmp_rating`], or `None`
    /// when the list is empty.
    pub fn top(candidates: &[Candidate]) -> Option<&Candidate> {
        candidates.iter().max_by(|a, b| a.cmp_rating(b))
    }

    /// Whether (x, y) lies inside the candidate's bounding box.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let r = self.diameter / 2;
        let x0 = self.center_x.saturating_sub(r);
        let y0 = self.center_y.saturating_sub(r);
        x >= x0 && x <= self.center_x + r && y >= y0 && y <= self.center_y + r
    }
}

/// Team color class of an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleColor {
    Magenta,
    Cyan,
    Unclassified,
}

/// Obstacle bounding box. Width and height are unsigned, so extents are
/// non-negative by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub color: ObstacleColor,
    pub confidence: f32,
}

/// A pixel believed to lie on a field boundary marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePoint {
    pub x: u32,
    pub y: u32,
}

/// Gated ball result inside a measurement event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallMeasurement {
    pub center_x: u32,
    pub center_y: u32,
    pub diameter: u32,
    pub rating: f32,
}

impl From<&Candidate> for BallMeasurement {
    fn from(c: &Candidate) -> Self {
        Self {
            center_x: c.center_x,
            center_y: c.center_y,
            diameter: c.diameter,
            rating: c.rating,
        }
    }
}

/// Final per-frame output bundle handed to the publishing boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEvent {
    pub seq: u64,
    pub stamp_ns: u64,
    pub ball: Option<BallMeasurement>,
    pub obstacles: Vec<Obstacle>,
    pub line_points: Vec<LinePoint>,
    pub debug_region: Option<HeatmapCrop>,
}
