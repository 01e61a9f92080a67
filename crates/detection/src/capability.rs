//! Capability interfaces for external vision models
//!
//! Implementations may hold model sessions that need exclusive access
//! during inference, hence `&mut self`.

use frame_capture::VideoFrame;

use crate::types::{BoundingBox, DetectedObject, FaceBox, Landmarks};
use crate::DetectionError;

/// Locates faces in a frame
pub trait FaceDetector: Send {
    fn detect_faces(&mut self, frame: &VideoFrame) -> Result<Vec<FaceBox>, DetectionError>;
}

/// Extracts 68-point landmarks for one face
pub trait LandmarkExtractor: Send {
    fn extract(
        &mut self,
        frame: &VideoFrame,
        face: &BoundingBox,
    ) -> Result<Landmarks, DetectionError>;
}

/// Computes an identity embedding for one face
pub trait FaceEmbedder: Send {
    fn embed(
        &mut self,
        frame: &VideoFrame,
        face: &BoundingBox,
        landmarks: Option<&Landmarks>,
    ) -> Result<Vec<f32>, DetectionError>;
}

/// Detects objects of any class; filtering happens in the adapter
pub trait ObjectDetector: Send {
    fn detect_objects(&mut self, frame: &VideoFrame) -> Result<Vec<DetectedObject>, DetectionError>;
}
