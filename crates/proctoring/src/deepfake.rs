//! Deepfake screening contract
//!
//! The classifier is an external, stateless collaborator called once per
//! submitted image, outside the per-frame pipeline.

use frame_capture::{FrameMetadata, VideoFrame};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Classifier error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classification failed: {0}")]
    Inference(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// Classifier verdict for one image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeepfakeVerdict {
    pub is_deepfake: bool,
    pub confidence: f32,
}

impl DeepfakeVerdict {
    /// Verdict reported when classification could not run
    pub const UNKNOWN_CLEAN: DeepfakeVerdict = DeepfakeVerdict {
        is_deepfake: false,
        confidence: 0.0,
    };

    pub fn new(is_deepfake: bool, confidence: f32) -> Self {
        Self {
            is_deepfake,
            confidence: if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) },
        }
    }
}

/// Deepfake classifier capability
pub trait DeepfakeClassifier: Send {
    fn classify(&mut self, frame: &VideoFrame) -> Result<DeepfakeVerdict, ClassifierError>;
}

/// Classify a frame, degrading any failure to a clean verdict with zero confidence
pub fn screen(classifier: &mut dyn DeepfakeClassifier, frame: &VideoFrame) -> DeepfakeVerdict {
    match classifier.classify(frame) {
        Ok(verdict) => {
            info!(
                participant = %frame.metadata().session.participant_id,
                is_deepfake = verdict.is_deepfake,
                confidence = verdict.confidence,
                "Deepfake check complete"
            );
            verdict
        }
        Err(e) => {
            warn!("Deepfake check failed, reporting clean: {}", e);
            DeepfakeVerdict::UNKNOWN_CLEAN
        }
    }
}

/// Decode and screen an encoded image
pub fn screen_encoded(
    classifier: &mut dyn DeepfakeClassifier,
    bytes: &[u8],
    metadata: FrameMetadata,
) -> DeepfakeVerdict {
    match VideoFrame::decode(bytes, metadata) {
        Ok(frame) => screen(classifier, &frame),
        Err(e) => {
            warn!("Deepfake check skipped for undecodable image: {}", e);
            DeepfakeVerdict::UNKNOWN_CLEAN
        }
    }
}

/// Classifier returning a fixed verdict (testing and placeholder deployments)
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    result: Result<DeepfakeVerdict, ClassifierError>,
}

impl FixedClassifier {
    pub fn new(verdict: DeepfakeVerdict) -> Self {
        Self { result: Ok(verdict) }
    }

    pub fn failing(error: ClassifierError) -> Self {
        Self { result: Err(error) }
    }
}

impl DeepfakeClassifier for FixedClassifier {
    fn classify(&mut self, _frame: &VideoFrame) -> Result<DeepfakeVerdict, ClassifierError> {
        self.result.clone()
    }
}
