//! Detection Adapter
//!
//! Wraps the external vision capabilities behind one uniform interface:
//! - Face detection (bounding boxes)
//! - 68-point facial landmarks
//! - Face embeddings for identity comparison
//! - Object detection filtered to prohibited classes
//!
//! Model-specific output shapes never leave this crate; downstream
//! components only see the normalized types in [`types`].

pub mod adapter;
pub mod capability;
pub mod config;
pub mod mock;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod types;

pub use adapter::{Capabilities, DetectionAdapter};
pub use capability::{FaceDetector, FaceEmbedder, LandmarkExtractor, ObjectDetector};
pub use config::DetectionConfig;
pub use types::{
    BoundingBox, DetectedObject, Detections, Embedding, Face, FaceBox, Landmarks, Point,
};

use thiserror::Error;

/// Detection error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(&'static str),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Landmark extraction failed: {0}")]
    LandmarkExtraction(String),

    #[error("Embedding extraction failed: {0}")]
    Embedding(String),
}

impl From<frame_capture::FrameError> for DetectionError {
    fn from(err: frame_capture::FrameError) -> Self {
        DetectionError::ImageProcessing(err.to_string())
    }
}
