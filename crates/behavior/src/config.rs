//! Behavior analysis configuration

use serde::{Deserialize, Serialize};

/// Behavior analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Eye aspect ratio below which an eye counts as closed
    pub ear_threshold: f32,

    /// Consecutive closed frames tolerated before alerting
    pub closure_frames: u32,

    /// Gaze history capacity
    pub gaze_history_len: usize,

    /// Samples required before gaze variance is evaluated
    pub gaze_min_samples: usize,

    /// Per-axis gaze variance that counts as unusual movement
    pub gaze_variance_threshold: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            closure_frames: 10,
            gaze_history_len: 10,
            gaze_min_samples: 5,
            gaze_variance_threshold: 0.4,
        }
    }
}

impl BehaviorConfig {
    /// Create strict config (earlier alerts)
    pub fn strict() -> Self {
        Self {
            closure_frames: 6,
            gaze_variance_threshold: 0.3,
            ..Default::default()
        }
    }

    /// Create lenient config (later alerts)
    pub fn lenient() -> Self {
        Self {
            closure_frames: 20,
            gaze_variance_threshold: 0.6,
            ..Default::default()
        }
    }
}
