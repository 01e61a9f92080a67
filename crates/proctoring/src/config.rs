//! Proctoring configuration

use behavior::BehaviorConfig;
use detection::DetectionConfig;
use identity::IdentityConfig;
use presence::PresenceConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete proctoring configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProctorConfig {
    pub detection: DetectionConfig,
    pub identity: IdentityConfig,
    pub behavior: BehaviorConfig,
    pub presence: PresenceConfig,
}

impl ProctorConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            detection: DetectionConfig {
                object_confidence: 0.4,
                ..Default::default()
            },
            identity: IdentityConfig {
                similarity_threshold: 0.7,
            },
            behavior: BehaviorConfig::strict(),
            presence: PresenceConfig::strict(),
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            detection: DetectionConfig {
                object_confidence: 0.7,
                ..Default::default()
            },
            identity: IdentityConfig {
                similarity_threshold: 0.5,
            },
            behavior: BehaviorConfig::lenient(),
            presence: PresenceConfig::lenient(),
        }
    }

    /// Reject thresholds outside their domains
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_range("detection.object_confidence", self.detection.object_confidence)?;
        unit_range("detection.face_confidence", self.detection.face_confidence)?;
        unit_range("identity.similarity_threshold", self.identity.similarity_threshold)?;

        if !(self.behavior.ear_threshold.is_finite() && self.behavior.ear_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "behavior.ear_threshold must be positive, got {}",
                self.behavior.ear_threshold
            )));
        }
        let variance = self.behavior.gaze_variance_threshold;
        if !(variance.is_finite() && variance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "behavior.gaze_variance_threshold must be non-negative, got {}",
                variance
            )));
        }
        if self.behavior.gaze_history_len == 0 {
            return Err(ConfigError::Invalid("behavior.gaze_history_len must be at least 1".into()));
        }
        let (min_samples, history_len) = (
            self.behavior.gaze_min_samples,
            self.behavior.gaze_history_len,
        );
        if min_samples == 0 || min_samples > history_len {
            return Err(ConfigError::Invalid(format!(
                "behavior.gaze_min_samples must be in 1..={}, got {}",
                history_len, min_samples
            )));
        }
        if self.detection.object_labels.is_empty() {
            return Err(ConfigError::Invalid("detection.object_labels must not be empty".into()));
        }
        Ok(())
    }
}

fn unit_range(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be in [0, 1], got {}", name, value)))
    }
}
