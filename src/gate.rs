//! Output gating
//!
//! Converts raw per-frame detector results into the measurement event handed
//! to the publishing boundary. The ball is suppressed below the publish
//! threshold; obstacles and line points always pass through; the debug region
//! is forwarded only when its channel is enabled, independent of the ball
//! decision.

use crate::candidate::{BallMeasurement, Candidate, LinePoint, MeasurementEvent, Obstacle};
use crate::detectors::BallDetection;
use crate::frame::Frame;

#[derive(Debug, Clone)]
pub struct OutputGate {
    /// Inclusive rating bound: a top candidate rated exactly at the
    /// threshold is published.
    pub ball_publish_threshold: f32,
    pub debug_enabled: bool,
}

impl OutputGate {
    pub fn assemble(
        &self,
        frame: &Frame,
        ball: BallDetection,
        obstacles: Vec<Obstacle>,
        line_points: Vec<LinePoint>,
    ) -> MeasurementEvent {
        let top = Candidate::top(&ball.candidates)
            .filter(|c| c.rating >= self.ball_publish_threshold)
            .map(BallMeasurement::from);

        MeasurementEvent {
            seq: frame.seq(),
            stamp_ns: frame.stamp_ns(),
            ball: top,
            obstacles,
            line_points,
            debug_region: if self.debug_enabled {
                ball.debug_region
            } else {
                None
            },
        }
    }
}
