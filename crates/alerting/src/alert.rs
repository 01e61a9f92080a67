//! Alert wire types

use serde::{Deserialize, Serialize};

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Weight used for risk scoring
    pub fn weight(&self) -> f32 {
        match self {
            Severity::Low => 0.1,
            Severity::Medium => 0.3,
            Severity::High => 0.7,
        }
    }

    /// Low-severity alerts report normal operation, not violations
    pub fn is_informational(&self) -> bool {
        matches!(self, Severity::Low)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

/// Alert kinds; the serialized names are a stable contract with consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// No face in view for longer than the threshold
    NoFace,
    /// More than one face in view for longer than the threshold
    MultipleFaces,
    /// First successful identity match in the session
    IdentityVerified,
    /// A face that does not match the enrolled reference
    IdentityMismatch,
    /// Fallback presence signal
    FaceDetected,
    /// Mobile phone in frame
    PhoneDetected,
    /// Any other configured object class
    ProhibitedObject,
    /// Prolonged eye closure
    EyeGazeDeviation,
    /// Unusual eye movement patterns
    SuspiciousBehavior,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::NoFace => "NO_FACE",
            AlertKind::MultipleFaces => "MULTIPLE_FACES",
            AlertKind::IdentityVerified => "IDENTITY_VERIFIED",
            AlertKind::IdentityMismatch => "IDENTITY_MISMATCH",
            AlertKind::FaceDetected => "FACE_DETECTED",
            AlertKind::PhoneDetected => "PHONE_DETECTED",
            AlertKind::ProhibitedObject => "PROHIBITED_OBJECT",
            AlertKind::EyeGazeDeviation => "EYE_GAZE_DEVIATION",
            AlertKind::SuspiciousBehavior => "SUSPICIOUS_BEHAVIOR",
        }
    }

    /// Fixed severity for each kind
    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::IdentityVerified | AlertKind::FaceDetected => Severity::Low,
            AlertKind::NoFace | AlertKind::EyeGazeDeviation | AlertKind::SuspiciousBehavior => {
                Severity::Medium
            }
            AlertKind::MultipleFaces
            | AlertKind::IdentityMismatch
            | AlertKind::PhoneDetected
            | AlertKind::ProhibitedObject => Severity::High,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single proctoring alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(rename = "alertType")]
    pub kind: AlertKind,
    pub description: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    pub severity: Severity,
}

impl Alert {
    /// Build an alert with the kind's severity; confidence is clamped to [0, 1]
    pub fn new(kind: AlertKind, description: impl Into<String>, confidence: f32) -> Self {
        Self {
            kind,
            description: description.into(),
            confidence: if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) },
            severity: kind.severity(),
        }
    }

    pub fn no_face() -> Self {
        Self::new(AlertKind::NoFace, "No face detected for extended period", 0.8)
    }

    pub fn multiple_faces(count: usize) -> Self {
        Self::new(
            AlertKind::MultipleFaces,
            format!("Multiple faces detected ({})", count),
            0.9,
        )
    }

    pub fn identity_verified(similarity: f32) -> Self {
        Self::new(
            AlertKind::IdentityVerified,
            format!("Face identity verified (similarity: {:.2})", similarity),
            similarity,
        )
    }

    pub fn identity_mismatch(similarity: f32) -> Self {
        Self::new(
            AlertKind::IdentityMismatch,
            format!("Face does not match registered user (similarity: {:.2})", similarity),
            1.0 - similarity,
        )
    }

    pub fn face_detected() -> Self {
        Self::new(AlertKind::FaceDetected, "Face detected in frame", 0.8)
    }

    /// Object alert; phones get their own kind
    pub fn object(label: &str, confidence: f32) -> Self {
        if label.eq_ignore_ascii_case("cell_phone") || label.eq_ignore_ascii_case("phone") {
            Self::new(
                AlertKind::PhoneDetected,
                format!("Mobile phone detected (confidence: {:.2})", confidence),
                confidence,
            )
        } else {
            Self::new(
                AlertKind::ProhibitedObject,
                format!("Prohibited object detected: {} (confidence: {:.2})", label, confidence),
                confidence,
            )
        }
    }

    pub fn prolonged_eye_closure() -> Self {
        Self::new(AlertKind::EyeGazeDeviation, "Prolonged eye closure detected", 0.7)
    }

    pub fn unusual_eye_movement() -> Self {
        Self::new(AlertKind::SuspiciousBehavior, "Unusual eye movement patterns detected", 0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(Alert::multiple_faces(2)).unwrap();
        assert_eq!(json["alertType"], "MULTIPLE_FACES");
        assert_eq!(json["severity"], "HIGH");
        assert_eq!(json["description"], "Multiple faces detected (2)");
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in [
            AlertKind::NoFace,
            AlertKind::MultipleFaces,
            AlertKind::IdentityVerified,
            AlertKind::IdentityMismatch,
            AlertKind::FaceDetected,
            AlertKind::PhoneDetected,
            AlertKind::ProhibitedObject,
            AlertKind::EyeGazeDeviation,
            AlertKind::SuspiciousBehavior,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }

    #[test]
    fn test_mismatch_confidence_is_complement() {
        let alert = Alert::identity_mismatch(0.25);
        assert!((alert.confidence - 0.75).abs() < 1e-6);
        assert_eq!(alert.severity, Severity::High);
    }

    #[test]
    fn test_object_kinds() {
        assert_eq!(Alert::object("cell_phone", 0.9).kind, AlertKind::PhoneDetected);
        assert_eq!(Alert::object("book", 0.9).kind, AlertKind::ProhibitedObject);
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Alert::new(AlertKind::FaceDetected, "x", 1.5).confidence, 1.0);
        assert_eq!(Alert::new(AlertKind::FaceDetected, "x", f32::NAN).confidence, 0.0);
    }
}
