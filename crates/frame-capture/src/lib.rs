//! Frame Capture Library for Exam Proctoring
//!
//! Provides the decoded frame type consumed by the analysis pipeline:
//! - RGB pixel buffers decoded from JPEG/PNG/WebP webcam captures
//! - Per-frame metadata (timestamp, meeting/participant/user ids)
//! - Lossless PNG encoding for deterministic test fixtures

pub mod frame;

pub use frame::{FrameMetadata, SessionIds, VideoFrame};

use thiserror::Error;

/// Frame error types
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Empty image buffer")]
    Empty,
}

impl From<image::ImageError> for FrameError {
    fn from(err: image::ImageError) -> Self {
        FrameError::Decode(err.to_string())
    }
}
