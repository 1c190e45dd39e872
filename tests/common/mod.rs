//! Shared fixtures: model artifacts on disk and synthetic field scenes

#![allow(dead_code)]

use fieldvision::config::{BallStrategy, VisionConfig};
use fieldvision::frame::Frame;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const SCENE_SIZE: u32 = 64;
pub const SKY_BOUNDARY: u32 = 12;

pub const SKY: [u8; 3] = [120, 120, 200];
pub const FIELD_GREEN: [u8; 3] = [0, 180, 0];
// Bright but saturated, so the ball reads as high luma without matching the
// white line classifier.
pub const BALL_ORANGE: [u8; 3] = [255, 220, 60];
pub const MAGENTA: [u8; 3] = [220, 30, 220];
pub const LINE_WHITE: [u8; 3] = [240, 240, 240];

/// Model artifacts written into a temp dir plus a config pointing at them.
pub struct Fixture {
    _dir: TempDir,
    pub config: VisionConfig,
}

pub fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    write_field_palette(&dir.path().join("field_colors.bin"));
    write_luma_table(&dir.path().join("ball_heatmap.bin"), 200);
    write_identity_table(&dir.path().join("ball_classifier.bin"));
    fs::write(
        dir.path().join("ball_cascade.json"),
        br#"{"windows":[8],"stages":[0.5,0.5]}"#,
    )
    .unwrap();

    let mut config = VisionConfig::default();
    config.ball_strategy = BallStrategy::Heatmap;
    config.horizon.field_color_path = dir.path().join("field_colors.bin");
    config.horizon.scan_stride = 4;
    config.heatmap.model_path = dir.path().join("ball_heatmap.bin");
    config.heatmap.threshold = 0.5;
    config.heatmap.expand_stepsize = 2;
    config.heatmap.pointcloud_stepsize = 4;
    config.heatmap.min_candidate_diameter = 5;
    config.heatmap.max_candidate_diameter = 40;
    config.heatmap.candidate_refinement_iteration_count = 2;
    config.cascade.cascade_path = dir.path().join("ball_cascade.json");
    config.cascade.classifier_model_path = dir.path().join("ball_classifier.bin");
    config.cascade.window_stride = 4;
    config.cascade.acceptance_threshold = 0.6;
    config.ball_publish_threshold = 0.5;

    Fixture { _dir: dir, config }
}

fn write_field_palette(path: &Path) {
    fs::write(path, FIELD_GREEN).unwrap();
}

/// 256-byte score table: full score at or above `cutoff` luma, zero below.
fn write_luma_table(path: &Path, cutoff: usize) {
    let mut table = [0u8; 256];
    for (i, v) in table.iter_mut().enumerate() {
        *v = if i >= cutoff { 255 } else { 0 };
    }
    fs::write(path, table).unwrap();
}

/// 256-byte rating table mapping mean luma straight to a rating.
fn write_identity_table(path: &Path) {
    let mut table = [0u8; 256];
    for (i, v) in table.iter_mut().enumerate() {
        *v = i as u8;
    }
    fs::write(path, table).unwrap();
}

/// What to draw into a synthetic scene.
#[derive(Default, Clone, Copy)]
pub struct Scene {
    /// Ball square: (x0, y0, size).
    pub ball: Option<(u32, u32, u32)>,
    /// Magenta robot block: (x0, y0, width, height).
    pub robot: Option<(u32, u32, u32, u32)>,
    /// Horizontal white line at this row.
    pub line_row: Option<u32>,
}

impl Scene {
    pub fn with_everything() -> Self {
        Self {
            ball: Some((28, 28, 9)),
            robot: Some((8, 20, 8, 16)),
            line_row: Some(48),
        }
    }
}

/// Render a 64x64 scene: sky above [`SKY_BOUNDARY`], field below, with the
/// requested features painted over the field.
pub fn scene_frame(seq: u64, scene: Scene) -> Frame {
    let mut data = Vec::with_capacity((SCENE_SIZE * SCENE_SIZE * 3) as usize);
    for y in 0..SCENE_SIZE {
        for x in 0..SCENE_SIZE {
            let mut rgb = if y < SKY_BOUNDARY { SKY } else { FIELD_GREEN };
            if let Some(row) = scene.line_row {
                if y == row {
                    rgb = LINE_WHITE;
                }
            }
            if let Some((rx, ry, rw, rh)) = scene.robot {
                if x >= rx && x < rx + rw && y >= ry && y < ry + rh {
                    rgb = MAGENTA;
                }
            }
            if let Some((bx, by, size)) = scene.ball {
                if x >= bx && x < bx + size && y >= by && y < by + size {
                    rgb = BALL_ORANGE;
                }
            }
            data.extend_from_slice(&rgb);
        }
    }
    Frame::new(seq, seq * 1_000_000, SCENE_SIZE, SCENE_SIZE, data).unwrap()
}
