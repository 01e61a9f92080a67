//! Scripted capability implementations
//!
//! Used when no model is configured and by tests across the workspace.
//! Each mock replays its script one call at a time and then keeps
//! returning the last step.

use std::collections::VecDeque;

use frame_capture::VideoFrame;

use crate::capability::{FaceDetector, FaceEmbedder, LandmarkExtractor, ObjectDetector};
use crate::types::{BoundingBox, DetectedObject, FaceBox, Landmarks};
use crate::DetectionError;

struct Script<T: Clone> {
    steps: VecDeque<Result<T, DetectionError>>,
    last: Result<T, DetectionError>,
}

impl<T: Clone> Script<T> {
    fn constant(value: Result<T, DetectionError>) -> Self {
        Self {
            steps: VecDeque::new(),
            last: value,
        }
    }

    fn sequence(steps: Vec<Result<T, DetectionError>>) -> Self {
        let last = steps
            .last()
            .cloned()
            .unwrap_or(Err(DetectionError::ModelUnavailable("empty mock script")));
        Self {
            steps: steps.into(),
            last,
        }
    }

    fn next(&mut self) -> Result<T, DetectionError> {
        self.steps.pop_front().unwrap_or_else(|| self.last.clone())
    }
}

fn mock_failure() -> DetectionError {
    DetectionError::Inference("mock failure".to_string())
}

/// Face detector replaying scripted face boxes
pub struct MockFaceDetector {
    script: Script<Vec<FaceBox>>,
}

impl MockFaceDetector {
    pub fn constant(faces: Vec<FaceBox>) -> Self {
        Self {
            script: Script::constant(Ok(faces)),
        }
    }

    /// One entry per frame
    pub fn sequence(frames: Vec<Vec<FaceBox>>) -> Self {
        Self {
            script: Script::sequence(frames.into_iter().map(Ok).collect()),
        }
    }

    pub fn scripted(steps: Vec<Result<Vec<FaceBox>, DetectionError>>) -> Self {
        Self {
            script: Script::sequence(steps),
        }
    }

    pub fn empty() -> Self {
        Self::constant(Vec::new())
    }

    pub fn failing() -> Self {
        Self {
            script: Script::constant(Err(mock_failure())),
        }
    }

    /// `count` identical faces side by side
    pub fn with_faces(count: usize) -> Self {
        let faces = (0..count)
            .map(|i| FaceBox::new(BoundingBox::new(i as f32 * 100.0, 50.0, 80.0, 80.0), 0.95))
            .collect();
        Self::constant(faces)
    }
}

impl FaceDetector for MockFaceDetector {
    fn detect_faces(&mut self, _frame: &VideoFrame) -> Result<Vec<FaceBox>, DetectionError> {
        self.script.next()
    }
}

/// Landmark extractor replaying scripted landmarks, one step per face
pub struct MockLandmarkExtractor {
    script: Script<Landmarks>,
}

impl MockLandmarkExtractor {
    pub fn constant(landmarks: Landmarks) -> Self {
        Self {
            script: Script::constant(Ok(landmarks)),
        }
    }

    pub fn sequence(steps: Vec<Result<Landmarks, DetectionError>>) -> Self {
        Self {
            script: Script::sequence(steps),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: Script::constant(Err(DetectionError::LandmarkExtraction(
                "mock failure".to_string(),
            ))),
        }
    }
}

impl LandmarkExtractor for MockLandmarkExtractor {
    fn extract(
        &mut self,
        _frame: &VideoFrame,
        _face: &BoundingBox,
    ) -> Result<Landmarks, DetectionError> {
        self.script.next()
    }
}

/// Embedder replaying scripted vectors, one step per face
pub struct MockEmbedder {
    script: Script<Vec<f32>>,
}

impl MockEmbedder {
    pub fn constant(vector: Vec<f32>) -> Self {
        Self {
            script: Script::constant(Ok(vector)),
        }
    }

    pub fn sequence(steps: Vec<Result<Vec<f32>, DetectionError>>) -> Self {
        Self {
            script: Script::sequence(steps),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: Script::constant(Err(DetectionError::Embedding("mock failure".to_string()))),
        }
    }
}

impl FaceEmbedder for MockEmbedder {
    fn embed(
        &mut self,
        _frame: &VideoFrame,
        _face: &BoundingBox,
        _landmarks: Option<&Landmarks>,
    ) -> Result<Vec<f32>, DetectionError> {
        self.script.next()
    }
}

/// Object detector replaying scripted detections
pub struct MockObjectDetector {
    script: Script<Vec<DetectedObject>>,
}

impl MockObjectDetector {
    pub fn constant(objects: Vec<DetectedObject>) -> Self {
        Self {
            script: Script::constant(Ok(objects)),
        }
    }

    /// One entry per frame
    pub fn sequence(frames: Vec<Vec<DetectedObject>>) -> Self {
        Self {
            script: Script::sequence(frames.into_iter().map(Ok).collect()),
        }
    }

    pub fn empty() -> Self {
        Self::constant(Vec::new())
    }

    pub fn failing() -> Self {
        Self {
            script: Script::constant(Err(mock_failure())),
        }
    }
}

impl ObjectDetector for MockObjectDetector {
    fn detect_objects(
        &mut self,
        _frame: &VideoFrame,
    ) -> Result<Vec<DetectedObject>, DetectionError> {
        self.script.next()
    }
}
