//! Reference face enrollment

use chrono::{DateTime, Utc};
use detection::{DetectionAdapter, Embedding, Landmarks};
use frame_capture::{FrameMetadata, VideoFrame};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::EnrollmentError;

/// Enrolled reference identity for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceIdentity {
    pub id: Uuid,
    pub embedding: Embedding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Landmarks>,
    /// Where the reference image came from (URL or path)
    pub source: String,
    pub enrolled_at: DateTime<Utc>,
}

impl ReferenceIdentity {
    /// Reference built from an embedding vector
    pub fn from_embedding(vector: Vec<f32>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            embedding: Embedding::Full(vector),
            landmarks: None,
            source: source.into(),
            enrolled_at: Utc::now(),
        }
    }

    /// Reference enrolled without a recognition model
    pub fn detection_only(source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            embedding: Embedding::Unavailable,
            landmarks: None,
            source: source.into(),
            enrolled_at: Utc::now(),
        }
    }

    pub fn is_detection_only(&self) -> bool {
        !self.embedding.is_available()
    }
}

/// Enroll from an encoded reference image (JPEG, PNG...)
pub fn enroll(
    adapter: &mut DetectionAdapter,
    image: &[u8],
    source: &str,
) -> Result<ReferenceIdentity, EnrollmentError> {
    let frame = VideoFrame::decode(image, FrameMetadata::default()).map_err(|e| {
        warn!("Failed to decode reference image from {}: {}", source, e);
        EnrollmentError::InvalidImage(e.to_string())
    })?;
    enroll_frame(adapter, &frame, source)
}

/// Enroll from an already decoded reference frame.
///
/// The first face in detector order becomes the reference.
pub fn enroll_frame(
    adapter: &mut DetectionAdapter,
    frame: &VideoFrame,
    source: &str,
) -> Result<ReferenceIdentity, EnrollmentError> {
    info!("Loading reference face from: {}", source);

    let mut faces = adapter
        .try_detect_faces(frame)
        .map_err(|e| EnrollmentError::Detection(e.to_string()))?;

    if faces.is_empty() {
        warn!("No face found in reference image {}", source);
        return Err(EnrollmentError::NoFaceInReference);
    }
    let face = faces.swap_remove(0);

    let embedding = if adapter.capabilities().embeddings {
        if !face.embedding.is_available() {
            return Err(EnrollmentError::EmbeddingFailed);
        }
        info!("Reference face encoding loaded successfully");
        face.embedding
    } else {
        info!("Recognition model unavailable, enrolling in detection-only mode");
        Embedding::Unavailable
    };

    Ok(ReferenceIdentity {
        id: Uuid::new_v4(),
        embedding,
        landmarks: face.landmarks,
        source: source.to_string(),
        enrolled_at: Utc::now(),
    })
}
