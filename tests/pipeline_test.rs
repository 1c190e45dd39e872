//! End-to-end frame orchestration tests

mod common;

use common::{fixture, scene_frame, Scene};
use fieldvision::candidate::{LinePoint, Obstacle, ObstacleColor};
use fieldvision::config::BallStrategy;
use fieldvision::detectors::{
    BallDetection, BallDetector, Horizon, HorizonEstimator, ObstacleDetector,
};
use fieldvision::error::VisionError;
use fieldvision::frame::Frame;
use fieldvision::Candidate;
use fieldvision::VisionPipeline;

struct FixedBall(f32);

impl BallDetector for FixedBall {
    fn detect(&self, _frame: &Frame, _horizon: &Horizon) -> Result<BallDetection, VisionError> {
        Ok(BallDetection {
            candidates: vec![Candidate {
                center_x: 32,
                center_y: 32,
                diameter: 10,
                rating: self.0,
            }],
            debug_region: None,
        })
    }
}

struct FailingObstacle;

impl ObstacleDetector for FailingObstacle {
    fn detect(&self, _frame: &Frame, _horizon: &Horizon) -> Result<Vec<Obstacle>, VisionError> {
        Err(VisionError::Detector("obstacle detector exploded".to_string()))
    }
}

struct FailingHorizon;

impl HorizonEstimator for FailingHorizon {
    fn estimate(&self, _frame: &Frame) -> Result<Horizon, VisionError> {
        Err(VisionError::Horizon("no boundary found".to_string()))
    }
}

#[test]
fn test_full_scene_measurement() {
    let fx = fixture();
    let pipeline = VisionPipeline::new(fx.config).unwrap();
    let frame = scene_frame(1, Scene::with_everything());

    let event = pipeline.process(&frame).unwrap();

    let ball = event.ball.expect("ball expected");
    assert_eq!(ball.center_x, 32);
    assert_eq!(ball.center_y, 32);
    assert_eq!(ball.diameter, 9);
    assert!(ball.rating >= 0.5);

    assert_eq!(event.obstacles.len(), 1);
    assert_eq!(event.obstacles[0].color, ObstacleColor::Magenta);

    assert!(!event.line_points.is_empty());
    assert!(event.line_points.iter().all(|p: &LinePoint| p.y == 48));

    assert_eq!(event.seq, 1);
}

#[test]
fn test_repeated_processing_is_deterministic() {
    let fx = fixture();
    let pipeline = VisionPipeline::new(fx.config).unwrap();
    let frame = scene_frame(3, Scene::with_everything());

    let first = pipeline.process(&frame).unwrap();
    let second = pipeline.process(&frame).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_and_sequential_equivalent() {
    let fx = fixture();
    let mut parallel_config = fx.config.clone();
    parallel_config.parallelize = true;
    let mut sequential_config = fx.config;
    sequential_config.parallelize = false;

    let parallel = VisionPipeline::new(parallel_config).unwrap();
    let sequential = VisionPipeline::new(sequential_config).unwrap();

    let frame = scene_frame(5, Scene::with_everything());
    assert_eq!(
        parallel.process(&frame).unwrap(),
        sequential.process(&frame).unwrap()
    );
}

#[test]
fn test_shuffled_scan_equivalent_for_single_ball() {
    let fx = fixture();
    let mut shuffled_config = fx.config.clone();
    shuffled_config.heatmap.shuffle_candidate_list = true;
    let plain = VisionPipeline::new(fx.config).unwrap();
    let shuffled = VisionPipeline::new(shuffled_config).unwrap();

    let frame = scene_frame(6, Scene::with_everything());
    assert_eq!(
        plain.process(&frame).unwrap().ball,
        shuffled.process(&frame).unwrap().ball
    );
}

#[test]
fn test_empty_scene_empty_event() {
    let fx = fixture();
    let pipeline = VisionPipeline::new(fx.config).unwrap();
    let frame = scene_frame(2, Scene::default());

    let event = pipeline.process(&frame).unwrap();
    assert!(event.ball.is_none());
    assert!(event.obstacles.is_empty());
    assert!(event.line_points.is_empty());
}

#[test]
fn test_publish_threshold_inclusive_bound() {
    let fx = fixture();
    let mut config = fx.config;
    config.ball_publish_threshold = 0.5;
    let mut pipeline = VisionPipeline::new(config).unwrap();
    let frame = scene_frame(1, Scene::default());

    let mut stack = pipeline.stack().clone();
    stack.ball = std::sync::Arc::new(FixedBall(0.5));
    pipeline.replace_stack(stack);
    // Rating exactly at the threshold is published.
    assert!(pipeline.process(&frame).unwrap().ball.is_some());

    let mut stack = pipeline.stack().clone();
    stack.ball = std::sync::Arc::new(FixedBall(0.499));
    pipeline.replace_stack(stack);
    // One step below is suppressed.
    assert!(pipeline.process(&frame).unwrap().ball.is_none());
}

#[test]
fn test_degraded_continuation_on_obstacle_failure() {
    let fx = fixture();
    let mut pipeline = VisionPipeline::new(fx.config).unwrap();
    let mut stack = pipeline.stack().clone();
    stack.obstacle = std::sync::Arc::new(FailingObstacle);
    pipeline.replace_stack(stack);

    let frame = scene_frame(4, Scene::with_everything());
    let event = pipeline.process(&frame).unwrap();

    // Obstacle contribution degrades to empty; ball and lines survive.
    assert!(event.obstacles.is_empty());
    assert!(event.ball.is_some());
    assert!(!event.line_points.is_empty());
}

#[test]
fn test_horizon_failure_drops_frame() {
    let fx = fixture();
    let mut pipeline = VisionPipeline::new(fx.config).unwrap();
    let mut stack = pipeline.stack().clone();
    stack.horizon = std::sync::Arc::new(FailingHorizon);
    pipeline.replace_stack(stack);

    let frame = scene_frame(4, Scene::with_everything());
    assert!(matches!(
        pipeline.process(&frame),
        Err(VisionError::Horizon(_))
    ));
}

#[test]
fn test_dummy_strategy_reports_no_ball() {
    let fx = fixture();
    let mut config = fx.config;
    config.ball_strategy = BallStrategy::Dummy;
    let pipeline = VisionPipeline::new(config).unwrap();

    let frame = scene_frame(1, Scene::with_everything());
    let event = pipeline.process(&frame).unwrap();
    assert!(event.ball.is_none());
    // The rest of the stack is unaffected by the stubbed ball strategy.
    assert_eq!(event.obstacles.len(), 1);
}

#[test]
fn test_cascade_strategy_finds_ball() {
    let fx = fixture();
    let mut config = fx.config;
    config.ball_strategy = BallStrategy::Cascade;
    let pipeline = VisionPipeline::new(config).unwrap();

    let frame = scene_frame(1, Scene::with_everything());
    let event = pipeline.process(&frame).unwrap();
    let ball = event.ball.expect("cascade ball expected");
    assert!(ball.center_x.abs_diff(32) <= 4);
    assert!(ball.center_y.abs_diff(32) <= 4);
}

#[test]
fn test_debug_region_only_when_enabled() {
    let fx = fixture();
    let mut config = fx.config.clone();
    config.heatmap.publish_debug_image = true;
    let debugging = VisionPipeline::new(config).unwrap();
    let silent = VisionPipeline::new(fx.config).unwrap();

    let frame = scene_frame(1, Scene::with_everything());
    assert!(debugging.process(&frame).unwrap().debug_region.is_some());
    assert!(silent.process(&frame).unwrap().debug_region.is_none());
}
