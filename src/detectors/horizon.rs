//! Field-boundary (horizon) estimation
//!
//! The horizon separates the sky and surroundings from the field carpet.
//! Every other detector restricts itself to the region under it, so horizon
//! estimation is the one stage whose failure drops the whole frame.

use super::{ColorClassifier, HorizonEstimator};
use crate::config::HorizonConfig;
use crate::error::VisionError;
use crate::frame::Frame;
use std::sync::Arc;
use tracing::debug;

/// Per-column field-boundary y values, derived once per frame and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Horizon {
    ys: Vec<u32>,
    height: u32,
}

impl Horizon {
    pub fn new(ys: Vec<u32>, height: u32) -> Self {
        Self { ys, height }
    }

    /// A constant horizon across the full width, for stubs and tests.
    pub fn flat(y: u32, width: u32, height: u32) -> Self {
        Self {
            ys: vec![y; width as usize],
            height,
        }
    }

    /// Boundary y at column x. Columns without any field pixel carry the
    /// frame height, putting nothing under the horizon there.
    pub fn y_at(&self, x: u32) -> u32 {
        let idx = (x as usize).min(self.ys.len().saturating_sub(1));
        self.ys[idx]
    }

    /// Whether (x, y) lies on or below the horizon shifted up by `offset`
    /// pixels. A positive offset is lenient: points slightly above the
    /// boundary still count.
    pub fn is_under(&self, x: u32, y: u32, offset: i32) -> bool {
        y as i64 >= self.y_at(x) as i64 - offset as i64
    }

    /// Smallest boundary y across all columns.
    pub fn min_y(&self) -> u32 {
        self.ys.iter().copied().min().unwrap_or(self.height)
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Horizon estimator backed by the learned field-color palette: per sampled
/// column, the boundary is the topmost field-colored pixel, interpolated
/// linearly between samples.
pub struct FieldHorizonEstimator {
    field: Arc<dyn ColorClassifier>,
    scan_stride: u32,
}

impl FieldHorizonEstimator {
    pub fn new(field: Arc<dyn ColorClassifier>, config: &HorizonConfig) -> Self {
        Self {
            field,
            scan_stride: config.scan_stride.max(1),
        }
    }

    fn scan_column(&self, frame: &Frame, x: u32) -> u32 {
        for y in 0..frame.height() {
            if self.field.matches(frame.rgb(x, y)) {
                return y;
            }
        }
        frame.height()
    }
}

impl HorizonEstimator for FieldHorizonEstimator {
    fn estimate(&self, frame: &Frame) -> Result<Horizon, VisionError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(VisionError::Horizon("Frame has zero extent".to_string()));
        }

        let width = frame.width();
        let mut ys = vec![frame.height(); width as usize];

        // Sampled columns, always including the last one so interpolation
        // covers the full width.
        let mut samples: Vec<(u32, u32)> = Vec::new();
        let mut x = 0;
        while x < width {
            samples.push((x, self.scan_column(frame, x)));
            x += self.scan_stride;
        }
        if samples.last().map(|&(sx, _)| sx) != Some(width - 1) {
            samples.push((width - 1, self.scan_column(frame, width - 1)));
        }

        if samples.len() == 1 {
            ys.fill(samples[0].1);
        }
        for pair in samples.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            let span = (x1 - x0) as i64;
            for x in x0..=x1 {
                let t = (x - x0) as i64;
                let y = y0 as i64 + (y1 as i64 - y0 as i64) * t / span.max(1);
                ys[x as usize] = y.clamp(0, frame.height() as i64) as u32;
            }
        }

        let horizon = Horizon::new(ys, frame.height());
        debug!(min_y = horizon.min_y(), "Estimated field horizon");
        Ok(horizon)
    }
}
