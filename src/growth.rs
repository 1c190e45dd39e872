//! Heatmap candidate growth
//!
//! Extracts ball candidates from a dense score map without a prior region
//! restriction: seeds are sampled on a grid, grown outward into bounding
//! boxes while the boundary keeps qualifying pixels, then refined around the
//! qualifying centroid. All thresholds are inclusive. A candidate's rating is
//! the mean qualifying score inside its final box.

use crate::candidate::Candidate;
use crate::config::HeatmapBallConfig;
use crate::detectors::Horizon;
use crate::frame::ScoreMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

// Fixed seed keeps the shuffled scan order identical across calls, so
// repeated processing of the same frame stays reproducible.
const SHUFFLE_SEED: u64 = 0x5eed_ba11;

/// Inclusive bounding box in map coordinates.
#[derive(Debug, Clone, Copy)]
struct GrowBox {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

impl GrowBox {
    fn seed(x: u32, y: u32) -> Self {
        Self {
            x0: x,
            x1: x,
            y0: y,
            y1: y,
        }
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }
}

/// Grow ball candidates out of `map`.
///
/// When `horizon` is given, only candidates whose center lies on or below the
/// horizon shifted by `publish_horizon_offset` are accepted. The returned
/// list preserves acceptance order; use [`Candidate::top`] for the
/// per-frame winner.
pub fn grow_candidates(
    map: &ScoreMap,
    params: &HeatmapBallConfig,
    horizon: Option<&Horizon>,
) -> Vec<Candidate> {
    if map.width() == 0 || map.height() == 0 {
        return Vec::new();
    }

    let mut seeds = seed_grid(map, params.pointcloud_stepsize.max(1));
    if params.shuffle_candidate_list {
        let mut rng = StdRng::seed_from_u64(SHUFFLE_SEED);
        seeds.shuffle(&mut rng);
    }

    let mut accepted: Vec<Candidate> = Vec::new();
    let mut accepted_boxes: Vec<GrowBox> = Vec::new();

    for (sx, sy) in seeds {
        if map.at(sx, sy) < params.threshold {
            continue;
        }
        if accepted_boxes.iter().any(|b| b.contains(sx, sy)) {
            continue;
        }

        let mut bbox = GrowBox::seed(sx, sy);
        grow(map, &mut bbox, params.threshold, params.expand_stepsize.max(1));
        for _ in 0..params.candidate_refinement_iteration_count {
            if !refine(map, &mut bbox, params.threshold) {
                break;
            }
        }

        let Some(rating) = qualifying_mean(map, &bbox, params.threshold) else {
            continue;
        };

        let diameter = bbox.width().max(bbox.height());
        if diameter < params.min_candidate_diameter || diameter > params.max_candidate_diameter {
            continue;
        }

        let center_x = (bbox.x0 + bbox.x1) / 2;
        let center_y = (bbox.y0 + bbox.y1) / 2;
        if let Some(horizon) = horizon {
            if !horizon.is_under(center_x, center_y, params.publish_horizon_offset) {
                continue;
            }
        }

        accepted.push(Candidate {
            center_x,
            center_y,
            diameter,
            rating,
        });
        accepted_boxes.push(bbox);
    }

    accepted
}

fn seed_grid(map: &ScoreMap, stepsize: u32) -> Vec<(u32, u32)> {
    let mut seeds = Vec::new();
    let mut y = 0;
    while y < map.height() {
        let mut x = 0;
        while x < map.width() {
            seeds.push((x, y));
            x += stepsize;
        }
        y += stepsize;
    }
    seeds
}

/// Expand the box one side at a time in `stepsize` increments while the new
/// boundary strip still contains a qualifying pixel.
fn grow(map: &ScoreMap, bbox: &mut GrowBox, threshold: f32, stepsize: u32) {
    loop {
        let mut grown = false;

        if bbox.x0 > 0 {
            let nx0 = bbox.x0.saturating_sub(stepsize);
            if strip_qualifies(map, nx0, bbox.x0 - 1, bbox.y0, bbox.y1, threshold) {
                bbox.x0 = nx0;
                grown = true;
            }
        }
        if bbox.x1 + 1 < map.width() {
            let nx1 = (bbox.x1 + stepsize).min(map.width() - 1);
            if strip_qualifies(map, bbox.x1 + 1, nx1, bbox.y0, bbox.y1, threshold) {
                bbox.x1 = nx1;
                grown = true;
            }
        }
        if bbox.y0 > 0 {
            let ny0 = bbox.y0.saturating_sub(stepsize);
            if strip_qualifies(map, bbox.x0, bbox.x1, ny0, bbox.y0 - 1, threshold) {
                bbox.y0 = ny0;
                grown = true;
            }
        }
        if bbox.y1 + 1 < map.height() {
            let ny1 = (bbox.y1 + stepsize).min(map.height() - 1);
            if strip_qualifies(map, bbox.x0, bbox.x1, bbox.y1 + 1, ny1, threshold) {
                bbox.y1 = ny1;
                grown = true;
            }
        }

        if !grown {
            break;
        }
    }
}

fn strip_qualifies(map: &ScoreMap, x0: u32, x1: u32, y0: u32, y1: u32, threshold: f32) -> bool {
    for y in y0..=y1 {
        for x in x0..=x1 {
            if map.at(x, y) >= threshold {
                return true;
            }
        }
    }
    false
}

/// One refinement iteration: re-center the box on the centroid of qualifying
/// pixels and re-measure its extent from them. Returns false when the box no
/// longer holds a qualifying pixel.
fn refine(map: &ScoreMap, bbox: &mut GrowBox, threshold: f32) -> bool {
    let mut count: u64 = 0;
    let mut sum_x: u64 = 0;
    let mut sum_y: u64 = 0;
    for y in bbox.y0..=bbox.y1 {
        for x in bbox.x0..=bbox.x1 {
            if map.at(x, y) >= threshold {
                count += 1;
                sum_x += x as u64;
                sum_y += y as u64;
            }
        }
    }
    if count == 0 {
        return false;
    }

    let cx = ((sum_x as f64 / count as f64) + 0.5) as u32;
    let cy = ((sum_y as f64 / count as f64) + 0.5) as u32;

    let mut half_w: u32 = 0;
    let mut half_h: u32 = 0;
    for y in bbox.y0..=bbox.y1 {
        for x in bbox.x0..=bbox.x1 {
            if map.at(x, y) >= threshold {
                half_w = half_w.max(x.abs_diff(cx));
                half_h = half_h.max(y.abs_diff(cy));
            }
        }
    }

    bbox.x0 = cx.saturating_sub(half_w);
    bbox.x1 = (cx + half_w).min(map.width() - 1);
    bbox.y0 = cy.saturating_sub(half_h);
    bbox.y1 = (cy + half_h).min(map.height() - 1);
    true
}

/// Mean qualifying score inside the box, or `None` when nothing qualifies.
fn qualifying_mean(map: &ScoreMap, bbox: &GrowBox, threshold: f32) -> Option<f32> {
    let mut count: u64 = 0;
    let mut sum: f64 = 0.0;
    for y in bbox.y0..=bbox.y1 {
        for x in bbox.x0..=bbox.x1 {
            let score = map.at(x, y);
            if score >= threshold {
                count += 1;
                sum += score as f64;
            }
        }
    }
    if count == 0 {
        None
    } else {
        Some((sum / count as f64) as f32)
    }
}
