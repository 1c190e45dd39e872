//! Differential reconfiguration
//!
//! A new configuration snapshot is compared group by group against its
//! predecessor; only capabilities whose group changed are rebuilt, so an
//! unrelated parameter tweak never reloads a model artifact. Failed rebuilds
//! keep the previously active instance in service.

use crate::config::{BallStrategy, VisionConfig};
use crate::detectors::{
    CascadeBallDetector, ColorObstacleDetector, DetectorStack, DummyBallDetector,
    FieldHorizonEstimator, FieldLineDetector, HeatmapBallDetector, PixelListClassifier,
};
use crate::detectors::{BallDetector, HorizonEstimator, LineDetector, ObstacleDetector};
use crate::error::VisionError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// A rebuildable capability of the detector stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CapabilityKind {
    Horizon,
    Ball,
    Obstacle,
    Line,
}

/// The exact set of work a reconciliation decided on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildPlan {
    capabilities: BTreeSet<CapabilityKind>,
    /// Transport bindings changed; no detector is touched for this.
    pub transport_changed: bool,
}

impl RebuildPlan {
    /// Plan rebuilding every capability, used for the first snapshot.
    pub fn full() -> Self {
        Self {
            capabilities: BTreeSet::from([
                CapabilityKind::Horizon,
                CapabilityKind::Ball,
                CapabilityKind::Obstacle,
                CapabilityKind::Line,
            ]),
            transport_changed: true,
        }
    }

    pub fn contains(&self, capability: CapabilityKind) -> bool {
        self.capabilities.contains(&capability)
    }

    /// True when no capability needs rebuilding.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn capabilities(&self) -> impl Iterator<Item = CapabilityKind> + '_ {
        self.capabilities.iter().copied()
    }

    fn insert(&mut self, capability: CapabilityKind) {
        self.capabilities.insert(capability);
    }
}

/// Decide which capabilities the new snapshot forces to rebuild.
///
/// The first delivery (`old == None`) always yields the full plan. A change
/// of the ball strategy selector forces the ball capability even when every
/// other key in its group is unchanged.
pub fn reconcile(old: Option<&VisionConfig>, new: &VisionConfig) -> RebuildPlan {
    let Some(old) = old else {
        return RebuildPlan::full();
    };

    let mut plan = RebuildPlan::default();
    if old.horizon != new.horizon {
        plan.insert(CapabilityKind::Horizon);
    }
    if old.ball_strategy != new.ball_strategy
        || old.cascade != new.cascade
        || old.heatmap != new.heatmap
    {
        plan.insert(CapabilityKind::Ball);
    }
    if old.obstacle != new.obstacle {
        plan.insert(CapabilityKind::Obstacle);
    }
    if old.line != new.line {
        plan.insert(CapabilityKind::Line);
    }
    plan.transport_changed = old.transport != new.transport;
    plan
}

/// One capability that could not be constructed from the new snapshot. The
/// previous instance stays wired in its place.
#[derive(Debug)]
pub struct RebuildFailure {
    pub capability: CapabilityKind,
    pub reason: String,
}

fn build_horizon(config: &VisionConfig) -> Result<Arc<dyn HorizonEstimator>, VisionError> {
    let field = Arc::new(PixelListClassifier::load(&config.horizon.field_color_path)?);
    Ok(Arc::new(FieldHorizonEstimator::new(field, &config.horizon)))
}

fn build_ball(config: &VisionConfig) -> Result<Arc<dyn BallDetector>, VisionError> {
    match config.ball_strategy {
        BallStrategy::Cascade => Ok(Arc::new(CascadeBallDetector::new(&config.cascade)?)),
        BallStrategy::Heatmap => Ok(Arc::new(HeatmapBallDetector::new(&config.heatmap)?)),
        BallStrategy::Dummy => Ok(Arc::new(DummyBallDetector)),
    }
}

fn build_obstacle(config: &VisionConfig) -> Result<Arc<dyn ObstacleDetector>, VisionError> {
    Ok(Arc::new(ColorObstacleDetector::new(&config.obstacle)))
}

fn build_line(config: &VisionConfig) -> Result<Arc<dyn LineDetector>, VisionError> {
    Ok(Arc::new(FieldLineDetector::new(&config.line)))
}

impl DetectorStack {
    /// Build a complete stack from scratch. Any capability failure aborts:
    /// with no previous instance to fall back on, a partial stack would
    /// violate the mandatory-capability invariant.
    pub fn build(config: &VisionConfig) -> Result<Self, VisionError> {
        Ok(Self {
            horizon: build_horizon(config)?,
            ball: build_ball(config)?,
            obstacle: build_obstacle(config)?,
            line: build_line(config)?,
        })
    }

    /// Execute a rebuild plan against this stack, producing its successor.
    ///
    /// Capabilities outside the plan are shared with the current stack.
    /// A failed construction is reported and leaves the current instance in
    /// service; the remaining plan entries still execute.
    pub fn rebuild(
        &self,
        plan: &RebuildPlan,
        config: &VisionConfig,
    ) -> (Self, Vec<RebuildFailure>) {
        let mut next = self.clone();
        let mut failures = Vec::new();

        for capability in plan.capabilities() {
            let result: Result<(), VisionError> = match capability {
                CapabilityKind::Horizon => {
                    build_horizon(config).map(|horizon| next.horizon = horizon)
                }
                CapabilityKind::Ball => build_ball(config).map(|ball| next.ball = ball),
                CapabilityKind::Obstacle => {
                    build_obstacle(config).map(|obstacle| next.obstacle = obstacle)
                }
                CapabilityKind::Line => build_line(config).map(|line| next.line = line),
            };
            match result {
                Ok(()) => info!(?capability, "Capability rebuilt"),
                Err(e) => {
                    warn!(?capability, error = %e, "Capability rebuild failed, previous instance stays active");
                    failures.push(RebuildFailure {
                        capability,
                        reason: e.to_string(),
                    });
                }
            }
        }

        (next, failures)
    }
}
