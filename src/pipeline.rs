//! Frame orchestration
//!
//! Runs one frame through the active detector stack and produces one
//! measurement event. Ball detection and the horizon-dependent rest can run
//! as a fork/join pair; both orders produce identical events since the frame
//! and the horizon are read-only after estimation.

use crate::candidate::{LinePoint, MeasurementEvent, Obstacle};
use crate::config::VisionConfig;
use crate::detectors::{BallDetection, DetectorStack, Horizon};
use crate::error::VisionError;
use crate::frame::Frame;
use crate::gate::OutputGate;
use crate::reconfigure::{reconcile, RebuildFailure};
use tracing::{debug, warn};

pub struct VisionPipeline {
    config: VisionConfig,
    stack: DetectorStack,
}

impl VisionPipeline {
    /// Validate the first snapshot and build the initial stack. With no
    /// previous instances to fall back on, any capability failure here is an
    /// error.
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        config.validate().map_err(VisionError::Config)?;
        let stack = DetectorStack::build(&config)?;
        Ok(Self { config, stack })
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Reconcile a new snapshot into the stack between frames.
    ///
    /// Only capabilities whose parameter group changed are rebuilt; failed
    /// rebuilds are returned and leave the previous instance in service. The
    /// snapshot itself always becomes current, so gating and orchestration
    /// flags take effect regardless.
    pub fn apply_config(&mut self, new: VisionConfig) -> Result<Vec<RebuildFailure>, VisionError> {
        new.validate().map_err(VisionError::Config)?;
        let plan = reconcile(Some(&self.config), &new);
        debug!(?plan, "Reconciled configuration snapshot");

        let failures = if plan.is_empty() {
            Vec::new()
        } else {
            let (next, failures) = self.stack.rebuild(&plan, &new);
            self.stack = next;
            failures
        };
        self.config = new;
        Ok(failures)
    }

    /// Process one frame into a measurement event.
    ///
    /// Horizon failure is the sole fatal-for-frame condition: the frame is
    /// dropped and the error returned. Any other detector failure degrades
    /// to an empty contribution for this frame.
    pub fn process(&self, frame: &Frame) -> Result<MeasurementEvent, VisionError> {
        let horizon = self.stack.horizon.estimate(frame)?;

        let (ball, (obstacles, lines)) = if self.config.parallelize {
            rayon::join(
                || self.detect_ball(frame, &horizon),
                || self.detect_rest(frame, &horizon),
            )
        } else {
            (
                self.detect_ball(frame, &horizon),
                self.detect_rest(frame, &horizon),
            )
        };

        let gate = OutputGate {
            ball_publish_threshold: self.config.ball_publish_threshold,
            debug_enabled: self.config.heatmap.publish_debug_image,
        };
        Ok(gate.assemble(frame, ball, obstacles, lines))
    }

    fn detect_ball(&self, frame: &Frame, horizon: &Horizon) -> BallDetection {
        match self.stack.ball.detect(frame, horizon) {
            Ok(detection) => detection,
            Err(e) => {
                warn!(seq = frame.seq(), error = %e, "Ball detection failed, continuing without");
                BallDetection::default()
            }
        }
    }

    fn detect_rest(&self, frame: &Frame, horizon: &Horizon) -> (Vec<Obstacle>, Vec<LinePoint>) {
        let obstacles = match self.stack.obstacle.detect(frame, horizon) {
            Ok(obstacles) => obstacles,
            Err(e) => {
                warn!(seq = frame.seq(), error = %e, "Obstacle detection failed, continuing without");
                Vec::new()
            }
        };
        let lines = match self.stack.line.detect(frame, horizon) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(seq = frame.seq(), error = %e, "Line detection failed, continuing without");
                Vec::new()
            }
        };
        (obstacles, lines)
    }

    /// Swap in a replacement stack wholesale. Test seam for injecting
    /// detector doubles; production reconfiguration goes through
    /// [`VisionPipeline::apply_config`].
    #[doc(hidden)]
    pub fn replace_stack(&mut self, stack: DetectorStack) {
        self.stack = stack;
    }

    #[doc(hidden)]
    pub fn stack(&self) -> &DetectorStack {
        &self.stack
    }
}
