//! End-to-end pipeline scenarios over scripted detectors

use detection::mock::{MockEmbedder, MockFaceDetector, MockLandmarkExtractor, MockObjectDetector};
use detection::{
    BoundingBox, DetectedObject, DetectionAdapter, DetectionConfig, FaceBox, Landmarks, Point,
};
use frame_capture::{FrameMetadata, SessionIds, VideoFrame};
use proctoring::{
    AlertKind, AnalysisMode, EnrollmentError, ProctorConfig, ProctoringEngine, SessionState,
};

fn session() -> SessionState {
    SessionState::new(SessionIds::new("meeting-1", "participant-1"), ProctorConfig::default())
}

fn frame(ts: u64) -> VideoFrame {
    VideoFrame::filled(32, 32, [128, 110, 90], FrameMetadata::at(ts))
}

fn reference_png() -> Vec<u8> {
    VideoFrame::filled(32, 32, [200, 170, 150], FrameMetadata::default())
        .encode_png()
        .unwrap()
}

fn eye(cx: f32, cy: f32, half_height: f32) -> [Point; 6] {
    [
        Point::new(cx - 10.0, cy),
        Point::new(cx - 5.0, cy - half_height),
        Point::new(cx + 5.0, cy - half_height),
        Point::new(cx + 10.0, cy),
        Point::new(cx + 5.0, cy + half_height),
        Point::new(cx - 5.0, cy + half_height),
    ]
}

fn face_landmarks(half_height: f32) -> Landmarks {
    Landmarks::from_eye_regions(eye(30.0, 50.0, half_height), eye(70.0, 50.0, half_height))
}

fn adapter(face_count: usize) -> DetectionAdapter {
    DetectionAdapter::new(
        DetectionConfig::default(),
        Box::new(MockFaceDetector::with_faces(face_count)),
    )
}

fn faces(count: usize) -> Vec<FaceBox> {
    (0..count)
        .map(|i| FaceBox::new(BoundingBox::new(i as f32 * 100.0, 40.0, 80.0, 80.0), 0.9))
        .collect()
}

#[test]
fn test_no_face_debounce_and_recovery() {
    let script = vec![faces(0), faces(0), faces(0), faces(0), faces(0), faces(1), faces(0)];
    let mut engine = ProctoringEngine::new(DetectionAdapter::new(
        DetectionConfig::default(),
        Box::new(MockFaceDetector::sequence(script)),
    ));
    let mut state = session();

    let timestamps = [0, 1000, 2000, 2999, 3000, 3500, 4000];
    let no_face: Vec<bool> = timestamps
        .iter()
        .map(|&ts| engine.analyze_frame(&frame(ts), &mut state).has_alert(AlertKind::NoFace))
        .collect();

    assert_eq!(no_face, vec![false, false, false, false, true, false, false]);
}

#[test]
fn test_six_frames_of_two_faces() {
    let mut engine = ProctoringEngine::new(adapter(2));
    let mut state = session();

    for i in 0..6u64 {
        let result = engine.analyze_frame(&frame(i * 1000), &mut state);
        assert_eq!(result.face_count, 2);
        assert_eq!(result.has_alert(AlertKind::MultipleFaces), i == 5, "frame {}", i + 1);
    }

    let seventh = engine.analyze_frame(&frame(6000), &mut state);
    assert!(seventh.has_alert(AlertKind::MultipleFaces));
}

#[test]
fn test_enroll_then_verify_zero_distance() {
    let embedding = vec![0.25f32; 128];
    let embedder = MockEmbedder::constant(embedding);
    let mut engine = ProctoringEngine::new(adapter(1).with_embedder(Box::new(embedder)));
    let mut state = session();

    engine.enroll(&reference_png(), "https://cdn/profile.jpg", &mut state).unwrap();
    assert!(state.is_enrolled());

    let result = engine.analyze_frame(&frame(0), &mut state);
    assert!(result.identity_verified);
    assert_eq!(result.identity_matches, 1);
    assert_eq!(result.alert_kinds(), vec![AlertKind::IdentityVerified]);
    assert_eq!(result.alerts[0].confidence, 1.0);

    // Verified alert is one-time; the fallback takes over
    let next = engine.analyze_frame(&frame(100), &mut state);
    assert_eq!(next.alert_kinds(), vec![AlertKind::FaceDetected]);
    assert!(next.identity_verified);
}

#[test]
fn test_identity_verified_never_reverts() {
    let embedder = MockEmbedder::sequence(vec![
        Ok(vec![0.0; 4]),
        Ok(vec![0.0; 4]),
        Ok(vec![1.0; 4]),
    ]);
    let mut engine = ProctoringEngine::new(adapter(1).with_embedder(Box::new(embedder)));
    let mut state = session();
    engine.enroll(&reference_png(), "profile", &mut state).unwrap();

    assert!(engine.analyze_frame(&frame(0), &mut state).identity_verified);

    let mismatch = engine.analyze_frame(&frame(100), &mut state);
    assert_eq!(mismatch.alert_kinds(), vec![AlertKind::IdentityMismatch, AlertKind::FaceDetected]);
    assert_eq!(mismatch.identity_matches, 0);
    assert!(mismatch.identity_verified);
    assert!(state.identity_verified());
}

#[test]
fn test_unenrolled_faces_fail_closed() {
    let embedder = MockEmbedder::constant(vec![0.5; 8]);
    let mut engine = ProctoringEngine::new(adapter(1).with_embedder(Box::new(embedder)));
    let mut state = session();

    let result = engine.analyze_frame(&frame(0), &mut state);
    assert!(!result.identity_verified);
    assert_eq!(result.alert_kinds(), vec![AlertKind::IdentityMismatch, AlertKind::FaceDetected]);
    assert_eq!(result.alerts[0].confidence, 1.0);
}

#[test]
fn test_detection_only_enrollment_verifies_any_face() {
    let extractor = MockLandmarkExtractor::constant(face_landmarks(6.0));
    let mut engine = ProctoringEngine::new(adapter(1).with_landmarks(Box::new(extractor)));
    let mut state = session();
    engine.enroll(&reference_png(), "profile", &mut state).unwrap();
    assert!(state.reference().unwrap().is_detection_only());

    let result = engine.analyze_frame(&frame(0), &mut state);
    assert_eq!(result.alert_kinds(), vec![AlertKind::IdentityVerified]);
    assert_eq!(result.alerts[0].confidence, 1.0);
}

#[test]
fn test_enrollment_without_face() {
    let mut engine = ProctoringEngine::new(DetectionAdapter::new(
        DetectionConfig::default(),
        Box::new(MockFaceDetector::empty()),
    ));
    let mut state = session();

    assert_eq!(
        engine.enroll(&reference_png(), "profile", &mut state),
        Err(EnrollmentError::NoFaceInReference)
    );
    assert!(!state.is_enrolled());
}

#[test]
fn test_prolonged_eye_closure() {
    let extractor = MockLandmarkExtractor::constant(face_landmarks(0.0));
    let mut engine = ProctoringEngine::new(adapter(1).with_landmarks(Box::new(extractor)));
    let mut state = session();

    for i in 0..10u64 {
        let result = engine.analyze_frame(&frame(i * 100), &mut state);
        assert!(!result.has_alert(AlertKind::EyeGazeDeviation));
    }

    let result = engine.analyze_frame(&frame(1000), &mut state);
    assert_eq!(
        result.alert_kinds(),
        vec![AlertKind::IdentityMismatch, AlertKind::EyeGazeDeviation, AlertKind::FaceDetected]
    );
    assert_eq!(state.behavior().eye_closure_frames, 11);
}

#[test]
fn test_landmark_failure_skips_only_that_face() {
    let extractor = MockLandmarkExtractor::sequence(vec![
        Err(detection::DetectionError::LandmarkExtraction("occluded".into())),
        Ok(face_landmarks(6.0)),
    ]);
    let mut engine = ProctoringEngine::new(adapter(2).with_landmarks(Box::new(extractor)));
    let mut state = session();

    let result = engine.analyze_frame(&frame(0), &mut state);
    assert_eq!(result.face_count, 2);
    assert_eq!(state.behavior().gaze_history.len(), 1);
}

#[test]
fn test_undecodable_frame_leaves_session_untouched() {
    let mut engine = ProctoringEngine::new(adapter(1));
    let mut state = session();
    engine.analyze_frame(&frame(0), &mut state);
    let before = state.clone();

    let truncated = b"\xff\xd8 truncated jpeg";
    let result = engine.analyze_encoded(truncated, FrameMetadata::at(500), &mut state);
    assert!(result.alerts.is_empty());
    assert!(!result.face_detected);
    assert!(result.error.is_some());
    assert_eq!(state, before);
}

#[test]
fn test_encoded_frame_matches_decoded_frame() {
    let original = VideoFrame::filled(24, 24, [12, 34, 56], FrameMetadata::at(0));
    let png = original.encode_png().unwrap();
    let decoded = VideoFrame::decode(&png, FrameMetadata::at(0)).unwrap();
    assert_eq!(decoded.data(), original.data());

    let mut engine = ProctoringEngine::new(adapter(1));
    let mut state = session();
    let result = engine.analyze_encoded(&png, FrameMetadata::at(0), &mut state);
    assert!(result.face_detected);
    assert!(result.error.is_none());
}

#[test]
fn test_basic_profile_ignores_identity_and_objects() {
    let phone = DetectedObject::new("cell_phone", 0.99, BoundingBox::default());
    let mut engine = ProctoringEngine::basic(
        adapter(1).with_objects(Box::new(MockObjectDetector::constant(vec![phone]))),
    );
    let mut state = session();
    engine.enroll(&reference_png(), "profile", &mut state).unwrap();

    let result = engine.analyze_frame(&frame(0), &mut state);
    assert_eq!(result.mode, AnalysisMode::Basic);
    assert!(!result.identity_verified);
    assert!(result.objects_detected.is_empty());
    assert_eq!(result.alert_kinds(), vec![AlertKind::FaceDetected]);
}

#[test]
fn test_alert_order_across_faces() {
    let mut engine = ProctoringEngine::new(
        adapter(2)
            .with_embedder(Box::new(MockEmbedder::sequence(vec![
                Ok(vec![0.0; 4]),
                Ok(vec![0.0; 4]),
                Ok(vec![0.0; 4]),
                Ok(vec![2.0; 4]),
            ])))
            .with_objects(Box::new(MockObjectDetector::constant(vec![DetectedObject::new(
                "cell_phone",
                0.7,
                BoundingBox::default(),
            )]))),
    );
    let mut state = session();

    // Enrollment embeds both faces and keeps the first
    engine.enroll(&reference_png(), "profile", &mut state).unwrap();

    let result = engine.analyze_frame(&frame(0), &mut state);
    assert_eq!(
        result.alert_kinds(),
        vec![AlertKind::PhoneDetected, AlertKind::IdentityVerified, AlertKind::IdentityMismatch]
    );
    assert_eq!(result.identity_matches, 1);
}

#[test]
fn test_session_summary_accumulates() {
    let mut engine = ProctoringEngine::new(DetectionAdapter::new(
        DetectionConfig::default(),
        Box::new(MockFaceDetector::empty()),
    ));
    let mut state = session();
    for i in 0..5u64 {
        engine.analyze_frame(&frame(i * 1000), &mut state);
    }

    // Frames at 3s and 4s raise NO_FACE
    assert_eq!(state.frames_analyzed(), 5);
    assert_eq!(state.summary().count_of(AlertKind::NoFace), 2);
    assert_eq!(state.summary().most_common(), Some(AlertKind::NoFace));
}

#[test]
fn test_clean_session_stays_low_risk() {
    let embedder = MockEmbedder::constant(vec![0.1; 8]);
    let mut engine = ProctoringEngine::new(adapter(1).with_embedder(Box::new(embedder)));
    let mut state = session();
    engine.enroll(&reference_png(), "profile", &mut state).unwrap();

    for i in 0..8u64 {
        engine.analyze_frame(&frame(i * 1000), &mut state);
    }

    // IDENTITY_VERIFIED once, then FACE_DETECTED on every later frame
    let summary = state.summary();
    assert_eq!(summary.total, 8);
    assert_eq!(summary.violations, 0);
    assert_eq!(summary.risk_level(), proctoring::RiskLevel::Low);
    assert_eq!(summary.most_common(), None);
}
