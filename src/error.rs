//! Error types for fieldvision

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Horizon error: {0}")]
    Horizon(String),

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
