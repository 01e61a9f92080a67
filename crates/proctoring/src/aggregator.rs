//! Alert aggregation over one frame's detections

use alerting::Alert;
use detection::Detections;
use tracing::debug;

use crate::result::{AnalysisMode, FrameAnalysisResult};
use crate::session::SessionState;

/// Turn detections into the ordered alert list, updating session state.
///
/// Order: objects, then each face's identity and behavior alerts in
/// detection order, then presence, then the FACE_DETECTED fallback.
pub(crate) fn aggregate(
    mode: AnalysisMode,
    detections: &Detections,
    timestamp_ms: u64,
    state: &mut SessionState,
) -> FrameAnalysisResult {
    match mode {
        AnalysisMode::Full => aggregate_full(detections, timestamp_ms, state),
        AnalysisMode::Basic => aggregate_basic(detections.face_count(), timestamp_ms, state),
    }
}

fn aggregate_full(
    detections: &Detections,
    timestamp_ms: u64,
    state: &mut SessionState,
) -> FrameAnalysisResult {
    let face_count = detections.face_count();
    let mut alerts: Vec<Alert> = detections
        .objects
        .iter()
        .map(|o| Alert::object(&o.label, o.confidence))
        .collect();

    let identity_config = state.config().identity.clone();
    let behavior_config = state.config().behavior.clone();

    let mut identity_matches = 0;
    let mut verified_this_frame = false;

    for (index, face) in detections.faces.iter().enumerate() {
        let verification = identity::verify(face, state.reference(), &identity_config);
        if verification.is_match {
            identity_matches += 1;
            if state.mark_verified() {
                verified_this_frame = true;
                alerts.push(Alert::identity_verified(verification.similarity));
            }
        } else {
            alerts.push(Alert::identity_mismatch(verification.similarity));
        }

        if let Some(landmarks) = &face.landmarks {
            match behavior::analyze(&behavior_config, &mut state.behavior, landmarks) {
                Ok(behavior_alerts) => alerts.extend(behavior_alerts),
                Err(e) => debug!("Skipping behavior analysis for face {}: {}", index, e),
            }
        }
    }

    let presence_config = state.config().presence.clone();
    alerts.extend(state.presence.update(&presence_config, face_count, timestamp_ms));

    if face_count > 0 && !verified_this_frame {
        alerts.push(Alert::face_detected());
    }

    FrameAnalysisResult {
        alerts,
        face_detected: face_count > 0,
        face_count,
        identity_verified: state.identity_verified(),
        identity_matches,
        objects_detected: detections.objects.iter().map(|o| o.label.clone()).collect(),
        timestamp: timestamp_ms,
        mode: AnalysisMode::Full,
        error: None,
    }
}

/// Presence-only profile
fn aggregate_basic(
    face_count: usize,
    timestamp_ms: u64,
    state: &mut SessionState,
) -> FrameAnalysisResult {
    let presence_config = state.config().presence.clone();
    let mut alerts = state.presence.update(&presence_config, face_count, timestamp_ms);

    if face_count > 0 {
        alerts.push(Alert::face_detected());
    }

    FrameAnalysisResult {
        alerts,
        face_detected: face_count > 0,
        face_count,
        identity_verified: false,
        identity_matches: 0,
        timestamp: timestamp_ms,
        mode: AnalysisMode::Basic,
        ..Default::default()
    }
}
