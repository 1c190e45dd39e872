//! Heatmap ball strategy
//!
//! Scores the full frame with a model artifact and grows candidates out of
//! the resulting score map. No prior region restriction: the horizon only
//! gates acceptance, and only when configured to.

use super::{BallDetection, BallDetector, Horizon};
use crate::candidate::Candidate;
use crate::config::HeatmapBallConfig;
use crate::error::VisionError;
use crate::frame::{Frame, ScoreMap};
use crate::growth;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Per-luma score table. The artifact is exactly 256 bytes, one score per
/// luma value; the training pipeline owns the format.
struct LumaScorer {
    table: [f32; 256],
}

impl LumaScorer {
    fn load(path: &Path) -> Result<Self, VisionError> {
        let bytes = fs::read(path).map_err(|e| {
            VisionError::Model(format!(
                "Failed to read heatmap model {}: {}",
                path.display(),
                e
            ))
        })?;
        if bytes.len() != 256 {
            return Err(VisionError::Model(format!(
                "Heatmap model {} has {} bytes, expected 256",
                path.display(),
                bytes.len()
            )));
        }
        let mut table = [0.0f32; 256];
        for (i, b) in bytes.iter().enumerate() {
            table[i] = *b as f32 / 255.0;
        }
        Ok(Self { table })
    }

    fn score_frame(&self, frame: &Frame) -> Result<ScoreMap, VisionError> {
        let mut scores = Vec::with_capacity((frame.width() * frame.height()) as usize);
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                scores.push(self.table[frame.luma(x, y) as usize]);
            }
        }
        ScoreMap::new(frame.width(), frame.height(), scores)
    }
}

/// Full-frame heatmap strategy: scorer plus candidate growth.
pub struct HeatmapBallDetector {
    scorer: LumaScorer,
    config: HeatmapBallConfig,
}

impl HeatmapBallDetector {
    /// Load the scorer artifact. A missing or malformed model file is a
    /// rebuild failure, reported to the reconfiguration path.
    pub fn new(config: &HeatmapBallConfig) -> Result<Self, VisionError> {
        let scorer = LumaScorer::load(&config.model_path)?;
        Ok(Self {
            scorer,
            config: config.clone(),
        })
    }
}

impl BallDetector for HeatmapBallDetector {
    fn detect(&self, frame: &Frame, horizon: &Horizon) -> Result<BallDetection, VisionError> {
        let map = self.scorer.score_frame(frame)?;
        let restriction = self.config.restrict_to_horizon.then_some(horizon);
        let candidates = growth::grow_candidates(&map, &self.config, restriction);
        debug!(count = candidates.len(), "Heatmap ball candidates grown");

        let debug_region = if self.config.publish_debug_image {
            Candidate::top(&candidates).map(|top| {
                let r = top.diameter / 2;
                map.crop(
                    top.center_x.saturating_sub(r),
                    top.center_y.saturating_sub(r),
                    top.diameter,
                    top.diameter,
                )
            })
        } else {
            None
        };

        Ok(BallDetection {
            candidates,
            debug_region,
        })
    }
}
