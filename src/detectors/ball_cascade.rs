//! Cascade ball strategy
//!
//! Horizon-restricted coarse window proposals filtered through the stages of
//! a cascade definition, then rated by a separately trained classifier
//! artifact. Both artifacts come from configuration paths; either one missing
//! is a rebuild failure.

use super::{BallDetection, BallDetector, Horizon};
use crate::candidate::Candidate;
use crate::config::CascadeBallConfig;
use crate::error::VisionError;
use crate::frame::Frame;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

// Pixels at or above this luma count toward a stage's bright fraction.
const STAGE_LUMA: u8 = 180;

/// Cascade definition artifact: window sizes to scan and per-stage bright
/// fraction thresholds evaluated on shrinking central crops.
#[derive(Debug, Clone, Deserialize)]
struct CascadeDefinition {
    windows: Vec<u32>,
    stages: Vec<f32>,
}

impl CascadeDefinition {
    fn load(path: &Path) -> Result<Self, VisionError> {
        let text = fs::read_to_string(path).map_err(|e| {
            VisionError::Model(format!(
                "Failed to read cascade definition {}: {}",
                path.display(),
                e
            ))
        })?;
        let def: CascadeDefinition = serde_json::from_str(&text).map_err(|e| {
            VisionError::Model(format!(
                "Cascade definition {} is malformed: {}",
                path.display(),
                e
            ))
        })?;
        if def.windows.is_empty() || def.stages.is_empty() {
            return Err(VisionError::Model(format!(
                "Cascade definition {} has no windows or stages",
                path.display()
            )));
        }
        if def.windows.iter().any(|&w| w == 0) {
            return Err(VisionError::Model(format!(
                "Cascade definition {} contains a zero-sized window",
                path.display()
            )));
        }
        Ok(def)
    }

    /// Run all stages over the window at (x0, y0). Stage k evaluates the
    /// central crop at scale 1/(k+1).
    fn passes(&self, frame: &Frame, x0: u32, y0: u32, size: u32) -> bool {
        for (k, &min_fraction) in self.stages.iter().enumerate() {
            let crop = (size / (k as u32 + 1)).max(1);
            let cx0 = x0 + (size - crop) / 2;
            let cy0 = y0 + (size - crop) / 2;
            let mut bright = 0u32;
            for y in cy0..cy0 + crop {
                for x in cx0..cx0 + crop {
                    if frame.luma(x, y) >= STAGE_LUMA {
                        bright += 1;
                    }
                }
            }
            if (bright as f32) < min_fraction * (crop * crop) as f32 {
                return false;
            }
        }
        true
    }
}

/// Classifier artifact: 256 bytes, a rating per mean window luma.
struct BallRater {
    table: [f32; 256],
}

impl BallRater {
    fn load(path: &Path) -> Result<Self, VisionError> {
        let bytes = fs::read(path).map_err(|e| {
            VisionError::Model(format!(
                "Failed to read ball classifier {}: {}",
                path.display(),
                e
            ))
        })?;
        if bytes.len() != 256 {
            return Err(VisionError::Model(format!(
                "Ball classifier {} has {} bytes, expected 256",
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

    fn rate(&self, frame: &Frame, x0: u32, y0: u32, size: u32) -> f32 {
        let mut sum = 0u64;
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                sum += frame.luma(x, y) as u64;
            }
        }
        let mean = (sum / (size as u64 * size as u64)) as usize;
        self.table[mean]
    }
}

/// Coarse-proposal-plus-classifier strategy.
pub struct CascadeBallDetector {
    cascade: CascadeDefinition,
    rater: BallRater,
    config: CascadeBallConfig,
}

impl CascadeBallDetector {
    pub fn new(config: &CascadeBallConfig) -> Result<Self, VisionError> {
        let cascade = CascadeDefinition::load(&config.cascade_path)?;
        let rater = BallRater::load(&config.classifier_model_path)?;
        Ok(Self {
            cascade,
            rater,
            config: config.clone(),
        })
    }
}

impl BallDetector for CascadeBallDetector {
    fn detect(&self, frame: &Frame, horizon: &Horizon) -> Result<BallDetection, VisionError> {
        let stride = self.config.window_stride.max(1);
        let mut candidates: Vec<Candidate> = Vec::new();

        for &size in &self.cascade.windows {
            if size > frame.width() || size > frame.height() {
                continue;
            }
            let mut y0 = 0;
            while y0 + size <= frame.height() {
                let mut x0 = 0;
                while x0 + size <= frame.width() {
                    let center_x = x0 + size / 2;
                    let center_y = y0 + size / 2;

                    let covered = candidates.iter().any(|c| c.contains(center_x, center_y));
                    if !covered
                        && horizon.is_under(center_x, center_y, self.config.candidate_y_offset)
                        && self.cascade.passes(frame, x0, y0, size)
                    {
                        let rating = self.rater.rate(frame, x0, y0, size);
                        if rating >= self.config.acceptance_threshold {
                            candidates.push(Candidate {
                                center_x,
                                center_y,
                                diameter: size,
                                rating,
                            });
                        }
                    }
                    x0 += stride;
                }
                y0 += stride;
            }
        }

        debug!(count = candidates.len(), "Cascade ball candidates rated");
        Ok(BallDetection {
            candidates,
            debug_region: None,
        })
    }
}
