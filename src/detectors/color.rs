//! Pixel color classification
//!
//! Two classifiers back the pipeline: a parametric HSV-range classifier for
//! team and line colors, and a learned field-color palette loaded from a
//! model artifact.

use crate::config::HsvRange;
use crate::error::VisionError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Pixel membership test. Implementations carry no per-frame state.
pub trait ColorClassifier: Send + Sync {
    fn matches(&self, rgb: [u8; 3]) -> bool;
}

/// Convert RGB8 to HSV with hue in [0, 180) and saturation/value in [0, 255],
/// the ranges the color models were tuned in.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> (u8, u8, u8) {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };

    ((h / 2.0) as u8, (s * 255.0) as u8, (max * 255.0) as u8)
}

/// Parametric classifier over an inclusive HSV range.
#[derive(Debug, Clone)]
pub struct HsvColorClassifier {
    range: HsvRange,
}

impl HsvColorClassifier {
    pub fn new(range: HsvRange) -> Self {
        Self { range }
    }
}

impl ColorClassifier for HsvColorClassifier {
    fn matches(&self, rgb: [u8; 3]) -> bool {
        let (h, s, v) = rgb_to_hsv(rgb);
        let (lh, ls, lv) = self.range.lower;
        let (uh, us, uv) = self.range.upper;
        h >= lh && h <= uh && s >= ls && s <= us && v >= lv && v <= uv
    }
}

// Palette entries are quantized to 5 bits per channel; the artifact was
// sampled densely enough that neighbors of every training pixel are present.
const QUANT_SHIFT: u8 = 3;

/// Learned color palette loaded from a model artifact: a flat sequence of
/// 3-byte RGB triplets. Lookup is by quantized value.
pub struct PixelListClassifier {
    palette: HashSet<(u8, u8, u8)>,
}

impl PixelListClassifier {
    pub fn load(path: &Path) -> Result<Self, VisionError> {
        let bytes = fs::read(path).map_err(|e| {
            VisionError::Model(format!(
                "Failed to read color palette {}: {}",
                path.display(),
                e
            ))
        })?;
        if bytes.is_empty() || bytes.len() % 3 != 0 {
            return Err(VisionError::Model(format!(
                "Color palette {} is malformed: {} bytes",
                path.display(),
                bytes.len()
            )));
        }
        let palette = bytes
            .chunks_exact(3)
            .map(|c| (c[0] >> QUANT_SHIFT, c[1] >> QUANT_SHIFT, c[2] >> QUANT_SHIFT))
            .collect();
        Ok(Self { palette })
    }
}

impl ColorClassifier for PixelListClassifier {
    fn matches(&self, rgb: [u8; 3]) -> bool {
        self.palette.contains(&(
            rgb[0] >> QUANT_SHIFT,
            rgb[1] >> QUANT_SHIFT,
            rgb[2] >> QUANT_SHIFT,
        ))
    }
}
