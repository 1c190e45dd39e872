//! Configuration snapshots for the vision pipeline
//!
//! A snapshot is always delivered whole; the reconfiguration differ compares
//! two complete snapshots group by group, so every tunable lives in exactly
//! one per-capability group (plus one for transport bindings).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ball detection backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallStrategy {
    /// Horizon-restricted coarse proposals rated by a classifier artifact.
    Cascade,
    /// Full-frame score map with iterative candidate growth.
    Heatmap,
    /// No-op stub, never reports a ball.
    Dummy,
}

/// Inclusive HSV bounds. Hue in [0, 180), saturation and value in [0, 255],
/// matching the ranges the color models were tuned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: (u8, u8, u8),
    pub upper: (u8, u8, u8),
}

/// Horizon estimator group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonConfig {
    /// Learned field-color palette artifact.
    pub field_color_path: PathBuf,
    /// Column sampling stride for the field-boundary scan.
    pub scan_stride: u32,
}

/// Cascade ball strategy group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeBallConfig {
    pub cascade_path: PathBuf,
    pub classifier_model_path: PathBuf,
    /// Candidates may sit this many pixels above the horizon and still count
    /// as under it.
    pub candidate_y_offset: i32,
    pub window_stride: u32,
    /// Minimum classifier rating for a proposal to become a candidate.
    pub acceptance_threshold: f32,
}

/// Heatmap ball strategy group, including the candidate-growth parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapBallConfig {
    pub model_path: PathBuf,
    pub threshold: f32,
    pub expand_stepsize: u32,
    pub pointcloud_stepsize: u32,
    pub shuffle_candidate_list: bool,
    pub min_candidate_diameter: u32,
    pub max_candidate_diameter: u32,
    pub candidate_refinement_iteration_count: u32,
    /// When set, candidates above the offset horizon are discarded.
    pub restrict_to_horizon: bool,
    pub publish_horizon_offset: i32,
    /// Emit the cropped score map around the top candidate on the debug
    /// channel.
    pub publish_debug_image: bool,
}

/// Obstacle detector group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub magenta: HsvRange,
    pub cyan: HsvRange,
    pub white: HsvRange,
    /// Column sampling stride of the under-horizon sweep.
    pub scan_stride: u32,
    /// Minimum matched pixels in a column before it counts as occupied.
    pub min_column_run: u32,
    /// Minimum obstacle width in pixels.
    pub min_width: u32,
}

/// Line detector group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    pub white: HsvRange,
    /// Grid stride of the under-horizon line-point sampling.
    pub sample_stride: u32,
}

/// Transport bindings. Changes here never rebuild a detector capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub frame_topic: String,
    pub ball_topic: String,
    pub obstacle_topic: String,
    pub line_topic: String,
    pub debug_topic: String,
    pub queue_size: usize,
}

/// One complete, immutable set of tunables. Delivered atomically; never
/// merged partially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionConfig {
    pub ball_strategy: BallStrategy,
    /// Run ball detection and the horizon-dependent rest concurrently.
    pub parallelize: bool,
    /// Inclusive rating bound for publishing the top ball candidate.
    pub ball_publish_threshold: f32,
    pub horizon: HorizonConfig,
    pub cascade: CascadeBallConfig,
    pub heatmap: HeatmapBallConfig,
    pub obstacle: ObstacleConfig,
    pub line: LineConfig,
    pub transport: TransportConfig,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            ball_strategy: BallStrategy::Heatmap,
            parallelize: true,
            ball_publish_threshold: 0.5,
            horizon: HorizonConfig {
                field_color_path: PathBuf::from("models/field_colors.bin"),
                scan_stride: 4,
            },
            cascade: CascadeBallConfig {
                cascade_path: PathBuf::from("models/ball_cascade.json"),
                classifier_model_path: PathBuf::from("models/ball_classifier.bin"),
                candidate_y_offset: 10,
                window_stride: 8,
                acceptance_threshold: 0.6,
            },
            heatmap: HeatmapBallConfig {
                model_path: PathBuf::from("models/ball_heatmap.bin"),
                threshold: 0.6,
                expand_stepsize: 4,
                pointcloud_stepsize: 10,
                shuffle_candidate_list: false,
                min_candidate_diameter: 15,
                max_candidate_diameter: 150,
                candidate_refinement_iteration_count: 1,
                restrict_to_horizon: true,
                publish_horizon_offset: 10,
                publish_debug_image: false,
            },
            obstacle: ObstacleConfig {
                magenta: HsvRange {
                    lower: (140, 80, 80),
                    upper: (170, 255, 255),
                },
                cyan: HsvRange {
                    lower: (80, 80, 80),
                    upper: (110, 255, 255),
                },
                white: HsvRange {
                    lower: (0, 0, 160),
                    upper: (180, 60, 255),
                },
                scan_stride: 2,
                min_column_run: 4,
                min_width: 4,
            },
            line: LineConfig {
                white: HsvRange {
                    lower: (0, 0, 160),
                    upper: (180, 60, 255),
                },
                sample_stride: 4,
            },
            transport: TransportConfig {
                frame_topic: "camera/image_raw".to_string(),
                ball_topic: "vision/ball".to_string(),
                obstacle_topic: "vision/obstacles".to_string(),
                line_topic: "vision/lines".to_string(),
                debug_topic: "vision/ball_heatmap".to_string(),
                queue_size: 1,
            },
        }
    }
}

impl VisionConfig {
    /// Validate the snapshot before it is applied.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.ball_publish_threshold) {
            return Err("Ball publish threshold must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.heatmap.threshold) {
            return Err("Heatmap threshold must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.cascade.acceptance_threshold) {
            return Err("Cascade acceptance threshold must be within [0, 1]".to_string());
        }
        if self.heatmap.expand_stepsize == 0 || self.heatmap.pointcloud_stepsize == 0 {
            return Err("Heatmap step sizes must be non-zero".to_string());
        }
        if self.heatmap.min_candidate_diameter > self.heatmap.max_candidate_diameter {
            return Err("Minimum candidate diameter exceeds maximum".to_string());
        }
        if self.horizon.scan_stride == 0
            || self.cascade.window_stride == 0
            || self.obstacle.scan_stride == 0
            || self.line.sample_stride == 0
        {
            return Err("Detector strides must be non-zero".to_string());
        }
        if self.transport.queue_size == 0 {
            return Err("Transport queue size must be non-zero".to_string());
        }
        Ok(())
    }
}
