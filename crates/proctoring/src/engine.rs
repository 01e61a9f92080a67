//! Proctoring engine

use detection::{adapter::log_capabilities, Capabilities, DetectionAdapter, Detections};
use frame_capture::{FrameMetadata, VideoFrame};
use identity::{EnrollmentError, ReferenceIdentity};
use tracing::{debug, info, warn};

use crate::aggregator::aggregate;
use crate::result::{AnalysisMode, FrameAnalysisResult};
use crate::session::SessionState;

/// Stateless per-frame analyzer; all session memory lives in [`SessionState`]
pub struct ProctoringEngine {
    adapter: DetectionAdapter,
    mode: AnalysisMode,
}

impl ProctoringEngine {
    /// Pick the profile from the adapter's capabilities
    pub fn new(adapter: DetectionAdapter) -> Self {
        let mode = if adapter.capabilities().is_basic() {
            AnalysisMode::Basic
        } else {
            AnalysisMode::Full
        };
        Self::with_mode(adapter, mode)
    }

    /// Presence-only profile regardless of capabilities
    pub fn basic(adapter: DetectionAdapter) -> Self {
        Self::with_mode(adapter, AnalysisMode::Basic)
    }

    fn with_mode(adapter: DetectionAdapter, mode: AnalysisMode) -> Self {
        log_capabilities(&adapter);
        match mode {
            AnalysisMode::Full => info!("Proctoring engine ready (full profile)"),
            AnalysisMode::Basic => {
                warn!("Advanced capabilities unavailable, using basic presence-only profile")
            }
        }
        Self { adapter, mode }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn capabilities(&self) -> Capabilities {
        self.adapter.capabilities()
    }

    /// Enroll a reference image into the session.
    ///
    /// On failure the session's existing reference is left in place.
    pub fn enroll(
        &mut self,
        image: &[u8],
        source: &str,
        state: &mut SessionState,
    ) -> Result<(), EnrollmentError> {
        let reference = self.enroll_reference(image, source)?;
        Self::install_reference(reference, state);
        Ok(())
    }

    /// Build a reference identity without installing it anywhere
    pub fn enroll_reference(
        &mut self,
        image: &[u8],
        source: &str,
    ) -> Result<ReferenceIdentity, EnrollmentError> {
        identity::enroll(&mut self.adapter, image, source)
    }

    pub fn enroll_frame(
        &mut self,
        frame: &VideoFrame,
        source: &str,
        state: &mut SessionState,
    ) -> Result<(), EnrollmentError> {
        let reference = identity::enroll_frame(&mut self.adapter, frame, source)?;
        Self::install_reference(reference, state);
        Ok(())
    }

    /// Install an already enrolled reference into a session
    pub fn install_reference(reference: ReferenceIdentity, state: &mut SessionState) {
        info!(
            participant = %state.ids().participant_id,
            enrollment = %reference.id,
            detection_only = reference.is_detection_only(),
            "Reference face enrolled"
        );
        state.set_reference(reference);
    }

    /// Analyze a decoded frame.
    ///
    /// Detection failures are treated as an empty frame (timers still
    /// advance) and reported through `error`.
    pub fn analyze_frame(
        &mut self,
        frame: &VideoFrame,
        state: &mut SessionState,
    ) -> FrameAnalysisResult {
        let timestamp_ms = frame.timestamp_ms();

        let (detections, error) = match self.detect(frame) {
            Ok(detections) => (detections, None),
            Err(e) => {
                warn!("Detection failed at {}ms: {}", timestamp_ms, e);
                metrics::counter!("proctor_frame_errors_total", "stage" => "detection")
                    .increment(1);
                (Detections::default(), Some(format!("detection failed: {}", e)))
            }
        };

        let mut result = self.analyze_detections(&detections, timestamp_ms, state);
        result.error = error;
        result
    }

    /// Decode then analyze; an undecodable frame leaves the session untouched
    pub fn analyze_encoded(
        &mut self,
        bytes: &[u8],
        metadata: FrameMetadata,
        state: &mut SessionState,
    ) -> FrameAnalysisResult {
        let timestamp_ms = metadata.timestamp_ms;
        match VideoFrame::decode(bytes, metadata) {
            Ok(frame) => self.analyze_frame(&frame, state),
            Err(e) => {
                warn!("Skipping undecodable frame at {}ms: {}", timestamp_ms, e);
                metrics::counter!("proctor_frame_errors_total", "stage" => "decode").increment(1);
                FrameAnalysisResult::failed(timestamp_ms, self.mode, e.to_string())
            }
        }
    }

    /// Run the aggregation stage over detections produced elsewhere
    pub fn analyze_detections(
        &self,
        detections: &Detections,
        timestamp_ms: u64,
        state: &mut SessionState,
    ) -> FrameAnalysisResult {
        Self::aggregate_detections(self.mode, detections, timestamp_ms, state)
    }

    /// Aggregation stage for a given profile.
    ///
    /// Needs no detector access, so callers can advance a session while
    /// the engine is busy elsewhere.
    pub fn aggregate_detections(
        mode: AnalysisMode,
        detections: &Detections,
        timestamp_ms: u64,
        state: &mut SessionState,
    ) -> FrameAnalysisResult {
        let result = aggregate(mode, detections, timestamp_ms, state);
        state.record_frame(&result.alerts);

        debug!(
            faces = result.face_count,
            alerts = result.alerts.len(),
            mode = mode.as_str(),
            timestamp_ms,
            "Frame analyzed"
        );
        metrics::counter!("proctor_frames_total", "mode" => mode.as_str()).increment(1);
        for alert in &result.alerts {
            metrics::counter!("proctor_alerts_total", "kind" => alert.kind.as_str()).increment(1);
        }

        result
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Detections, detection::DetectionError> {
        match self.mode {
            AnalysisMode::Full => self.adapter.try_detect(frame),
            AnalysisMode::Basic => Ok(Detections {
                faces: self.adapter.try_detect_faces(frame)?,
                objects: Vec::new(),
            }),
        }
    }
}

impl std::fmt::Debug for ProctoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProctoringEngine")
            .field("mode", &self.mode)
            .field("adapter", &self.adapter)
            .finish()
    }
}
