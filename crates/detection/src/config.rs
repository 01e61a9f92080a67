//! Detection configuration

use serde::{Deserialize, Serialize};

/// Detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum object confidence to accept a detection
    pub object_confidence: f32,

    /// Object classes of interest; everything else is dropped
    pub object_labels: Vec<String>,

    /// Minimum face confidence (0 accepts every face the detector returns)
    pub face_confidence: f32,

    /// Model paths
    pub face_model_path: Option<String>,
    pub landmark_model_path: Option<String>,
    pub object_model_path: Option<String>,
    pub embedding_model_path: Option<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            object_confidence: 0.5,
            object_labels: vec!["cell_phone".to_string()],
            face_confidence: 0.0,
            face_model_path: None,
            landmark_model_path: None,
            object_model_path: None,
            embedding_model_path: None,
        }
    }
}

impl DetectionConfig {
    /// Whether an object label is one of the configured classes
    pub fn is_label_of_interest(&self, label: &str) -> bool {
        self.object_labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}
