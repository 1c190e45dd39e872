//! fieldvision: real-time soccer-robot perception
//!
//! Per camera frame, the pipeline locates the ball, classifies obstacles by
//! team color and extracts field-line points, publishing gated measurement
//! events to downstream localization and behavior consumers. Detection
//! backends are reconfigurable at runtime: a new configuration snapshot is
//! diffed against the previous one and only the affected detectors are
//! rebuilt, so model artifacts are never reloaded for unrelated tweaks.

pub mod candidate;
pub mod config;
pub mod detectors;
pub mod error;
pub mod frame;
pub mod gate;
pub mod growth;
pub mod pipeline;
pub mod reconfigure;
pub mod service;

pub use candidate::{Candidate, LinePoint, MeasurementEvent, Obstacle, ObstacleColor};
pub use config::{BallStrategy, VisionConfig};
pub use error::VisionError;
pub use frame::Frame;
pub use pipeline::VisionPipeline;
pub use service::VisionService;
