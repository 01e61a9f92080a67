//! Uniform detection adapter over the external capabilities

use frame_capture::VideoFrame;
use tracing::{debug, info, warn};

use crate::capability::{FaceDetector, FaceEmbedder, LandmarkExtractor, ObjectDetector};
use crate::types::{DetectedObject, Detections, Embedding, Face};
use crate::{DetectionConfig, DetectionError};

/// Which optional capabilities are wired in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub landmarks: bool,
    pub embeddings: bool,
    pub objects: bool,
}

impl Capabilities {
    /// True when only the face detector is available
    pub fn is_basic(&self) -> bool {
        !self.landmarks && !self.embeddings && !self.objects
    }
}

/// Detection adapter producing normalized detections
pub struct DetectionAdapter {
    config: DetectionConfig,
    face_detector: Box<dyn FaceDetector>,
    landmark_extractor: Option<Box<dyn LandmarkExtractor>>,
    embedder: Option<Box<dyn FaceEmbedder>>,
    object_detector: Option<Box<dyn ObjectDetector>>,
}

impl DetectionAdapter {
    /// Create an adapter with only a face detector
    pub fn new(config: DetectionConfig, face_detector: Box<dyn FaceDetector>) -> Self {
        Self {
            config,
            face_detector,
            landmark_extractor: None,
            embedder: None,
            object_detector: None,
        }
    }

    pub fn with_landmarks(mut self, extractor: Box<dyn LandmarkExtractor>) -> Self {
        self.landmark_extractor = Some(extractor);
        self
    }

    pub fn with_embedder(mut self, embedder: Box<dyn FaceEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_objects(mut self, detector: Box<dyn ObjectDetector>) -> Self {
        self.object_detector = Some(detector);
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            landmarks: self.landmark_extractor.is_some(),
            embeddings: self.embedder.is_some(),
            objects: self.object_detector.is_some(),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect faces and objects; never fails.
    ///
    /// Any model failure is logged and reported as an empty frame.
    pub fn detect(&mut self, frame: &VideoFrame) -> Detections {
        match self.try_detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Detection failed, treating frame as empty: {}", e);
                Detections::default()
            }
        }
    }

    /// Detect faces and objects, surfacing model failures
    pub fn try_detect(&mut self, frame: &VideoFrame) -> Result<Detections, DetectionError> {
        let faces = self.try_detect_faces(frame)?;
        let objects = self.try_detect_objects(frame)?;
        debug!(
            faces = faces.len(),
            objects = objects.len(),
            timestamp_ms = frame.timestamp_ms(),
            "Frame detections"
        );
        Ok(Detections { faces, objects })
    }

    /// Detect and enrich faces in detector order.
    ///
    /// Landmark or embedding failures only degrade the face they belong to.
    pub fn try_detect_faces(&mut self, frame: &VideoFrame) -> Result<Vec<Face>, DetectionError> {
        let boxes = self.face_detector.detect_faces(frame)?;
        let min_confidence = self.config.face_confidence;

        let mut faces = Vec::with_capacity(boxes.len());
        let accepted = boxes.into_iter().filter(|b| b.confidence >= min_confidence);
        for (index, face_box) in accepted.enumerate() {
            let mut face = Face::bare(face_box);

            if let Some(extractor) = self.landmark_extractor.as_mut() {
                match extractor.extract(frame, &face.bbox) {
                    Ok(landmarks) => face.landmarks = Some(landmarks),
                    Err(e) => debug!("Landmarks unavailable for face {}: {}", index, e),
                }
            }

            if let Some(embedder) = self.embedder.as_mut() {
                match embedder.embed(frame, &face.bbox, face.landmarks.as_ref()) {
                    Ok(vector) => face.embedding = Embedding::Full(vector),
                    Err(e) => debug!("Embedding unavailable for face {}: {}", index, e),
                }
            }

            faces.push(face);
        }

        Ok(faces)
    }

    fn try_detect_objects(
        &mut self,
        frame: &VideoFrame,
    ) -> Result<Vec<DetectedObject>, DetectionError> {
        let Some(detector) = self.object_detector.as_mut() else {
            return Ok(Vec::new());
        };

        let raw = detector.detect_objects(frame)?;
        let total = raw.len();
        let accepted: Vec<DetectedObject> = raw
            .into_iter()
            .filter(|o| o.confidence >= self.config.object_confidence)
            .filter(|o| self.config.is_label_of_interest(&o.label))
            .collect();

        if accepted.len() < total {
            debug!(
                "Dropped {} object detections below threshold or out of scope",
                total - accepted.len()
            );
        }
        Ok(accepted)
    }
}

impl std::fmt::Debug for DetectionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionAdapter")
            .field("config", &self.config)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Log the capability set once at startup
pub fn log_capabilities(adapter: &DetectionAdapter) {
    let caps = adapter.capabilities();
    info!(
        landmarks = caps.landmarks,
        embeddings = caps.embeddings,
        objects = caps.objects,
        "Detection adapter ready"
    );
}
