//! Frame and score-map rasters

use crate::error::VisionError;
use std::sync::Arc;

/// One captured camera image.
///
/// Immutable for its whole processing cycle: detectors only ever read it.
/// The pixel buffer is reference counted so forked per-frame work can share
/// it without copying.
#[derive(Debug, Clone)]
pub struct Frame {
    seq: u64,
    stamp_ns: u64,
    width: u32,
    height: u32,
    data: Arc<[u8]>,
}

impl Frame {
    /// Create a frame from an RGB8 pixel buffer (`width * height * 3` bytes).
    pub fn new(
        seq: u64,
        stamp_ns: u64,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<Self, VisionError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(VisionError::Config(format!(
                "Frame buffer size mismatch: got {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            seq,
            stamp_ns,
            width,
            height,
            data: data.into(),
        })
    }

    /// Create a frame stamped with the current wall clock, for sources that
    /// do not carry their own capture timestamp.
    pub fn captured_now(
        seq: u64,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<Self, VisionError> {
        let stamp_ns = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| chrono::Utc::now().timestamp() * 1_000_000_000)
            as u64;
        Self::new(seq, stamp_ns, width, height, data)
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn stamp_ns(&self) -> u64 {
        self.stamp_ns
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB value at (x, y). Panics if out of bounds, callers stay inside
    /// `width()`/`height()`.
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        debug_assert!(x < self.width && y < self.height);
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Rec. 601 luma of the pixel at (x, y).
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        let [r, g, b] = self.rgb(x, y);
        ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
    }
}

/// Dense per-pixel score raster produced by the heatmap ball scorer.
#[derive(Debug, Clone)]
pub struct ScoreMap {
    width: u32,
    height: u32,
    scores: Vec<f32>,
}

impl ScoreMap {
    pub fn new(width: u32, height: u32, scores: Vec<f32>) -> Result<Self, VisionError> {
        let expected = width as usize * height as usize;
        if scores.len() != expected {
            return Err(VisionError::Detector(format!(
                "Score map size mismatch: got {} scores, expected {} for {}x{}",
                scores.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            scores,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn at(&self, x: u32, y: u32) -> f32 {
        debug_assert!(x < self.width && y < self.height);
        self.scores[y as usize * self.width as usize + x as usize]
    }

    /// Copy out a rectangular region, clamped to the map bounds.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> HeatmapCrop {
        let x1 = (x + width).min(self.width);
        let y1 = (y + height).min(self.height);
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let mut scores = Vec::with_capacity(((x1 - x0) * (y1 - y0)) as usize);
        for cy in y0..y1 {
            for cx in x0..x1 {
                scores.push(self.at(cx, cy));
            }
        }
        HeatmapCrop {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
            scores,
        }
    }
}

/// Cropped score-map region emitted on the debug channel.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HeatmapCrop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub scores: Vec<f32>,
}
