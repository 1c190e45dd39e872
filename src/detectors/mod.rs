//! Detector capability contracts and the active detector stack

pub mod ball_cascade;
pub mod ball_heatmap;
pub mod color;
pub mod horizon;
pub mod lines;
pub mod obstacle;

pub use ball_cascade::CascadeBallDetector;
pub use ball_heatmap::HeatmapBallDetector;
pub use color::{ColorClassifier, HsvColorClassifier, PixelListClassifier};
pub use horizon::{FieldHorizonEstimator, Horizon};
pub use lines::FieldLineDetector;
pub use obstacle::ColorObstacleDetector;

use crate::candidate::{Candidate, LinePoint, Obstacle};
use crate::error::VisionError;
use crate::frame::{Frame, HeatmapCrop};
use std::sync::Arc;

/// Estimates the field boundary for one frame. The sole detector every other
/// capability may depend on; its failure drops the frame.
pub trait HorizonEstimator: Send + Sync {
    fn estimate(&self, frame: &Frame) -> Result<Horizon, VisionError>;
}

/// Per-frame ball strategy output.
#[derive(Debug, Clone, Default)]
pub struct BallDetection {
    pub candidates: Vec<Candidate>,
    /// Cropped score region around the top candidate, for the debug channel.
    pub debug_region: Option<HeatmapCrop>,
}

/// One of the interchangeable ball strategies.
pub trait BallDetector: Send + Sync {
    fn detect(&self, frame: &Frame, horizon: &Horizon) -> Result<BallDetection, VisionError>;
}

/// Classifies under-horizon regions into team-colored obstacles.
pub trait ObstacleDetector: Send + Sync {
    fn detect(&self, frame: &Frame, horizon: &Horizon) -> Result<Vec<Obstacle>, VisionError>;
}

/// Extracts field-line points from the under-horizon region.
pub trait LineDetector: Send + Sync {
    fn detect(&self, frame: &Frame, horizon: &Horizon) -> Result<Vec<LinePoint>, VisionError>;
}

/// Ball stub: reports no candidates, used when ball detection is disabled.
#[derive(Debug, Default)]
pub struct DummyBallDetector;

impl BallDetector for DummyBallDetector {
    fn detect(&self, _frame: &Frame, _horizon: &Horizon) -> Result<BallDetection, VisionError> {
        Ok(BallDetection::default())
    }
}

/// The live set of capability instances wired into the orchestrator.
///
/// Exactly one stack is active at a time; reconfiguration builds a successor
/// and swaps it in whole between frames. Untouched capabilities are shared
/// with the predecessor via `Arc`, so unrelated parameter tweaks never reload
/// model artifacts.
#[derive(Clone)]
pub struct DetectorStack {
    pub horizon: Arc<dyn HorizonEstimator>,
    pub ball: Arc<dyn BallDetector>,
    pub obstacle: Arc<dyn ObstacleDetector>,
    pub line: Arc<dyn LineDetector>,
}
