//! Behavioral Analysis
//!
//! Landmark-based signals for a monitored exam-taker:
//! - Eye aspect ratio and prolonged eye closure
//! - Gaze direction and unusual eye movement

mod config;
mod ear;
mod gaze;

pub use config::BehaviorConfig;
pub use ear::{eye_aspect_ratio, frame_ear};
pub use gaze::{gaze_direction, Gaze, GazeHistory};

use alerting::Alert;
use detection::Landmarks;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Behavior analysis error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BehaviorError {
    #[error("Degenerate eye contour")]
    DegenerateEye,
}

/// Per-session behavior state (tracked over time)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorState {
    /// Consecutive frames with EAR below threshold
    pub eye_closure_frames: u32,

    /// Recent gaze directions
    pub gaze_history: GazeHistory,
}

impl BehaviorState {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            eye_closure_frames: 0,
            gaze_history: GazeHistory::new(config.gaze_history_len),
        }
    }

    /// Reset state (on participant change)
    pub fn reset(&mut self) {
        self.eye_closure_frames = 0;
        self.gaze_history.clear();
    }
}

impl Default for BehaviorState {
    fn default() -> Self {
        Self::new(&BehaviorConfig::default())
    }
}

/// Analyze one face's landmarks, updating the session's behavior state.
///
/// A degenerate eye contour leaves the state untouched.
pub fn analyze(
    config: &BehaviorConfig,
    state: &mut BehaviorState,
    landmarks: &Landmarks,
) -> Result<Vec<Alert>, BehaviorError> {
    let ear = frame_ear(landmarks).ok_or(BehaviorError::DegenerateEye)?;
    let mut alerts = Vec::new();

    if ear < config.ear_threshold {
        state.eye_closure_frames = state.eye_closure_frames.saturating_add(1);
    } else {
        state.eye_closure_frames = 0;
    }

    if state.eye_closure_frames > config.closure_frames {
        debug!("Eyes closed for {} frames (EAR {:.3})", state.eye_closure_frames, ear);
        alerts.push(Alert::prolonged_eye_closure());
    }

    state.gaze_history.push(gaze_direction(landmarks));

    if state.gaze_history.len() >= config.gaze_min_samples {
        if let Some(variance) = state.gaze_history.max_variance() {
            if variance > config.gaze_variance_threshold {
                debug!("Gaze variance {:.3} over {} samples", variance, state.gaze_history.len());
                alerts.push(Alert::unusual_eye_movement());
            }
        }
    }

    Ok(alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ear::tests::eye;
    use alerting::AlertKind;
    use detection::Point;

    fn open_face() -> Landmarks {
        Landmarks::from_eye_regions(eye(30.0, 50.0, 10.0, 6.0), eye(70.0, 50.0, 10.0, 6.0))
    }

    fn closed_face() -> Landmarks {
        Landmarks::from_eye_regions(eye(30.0, 50.0, 10.0, 0.0), eye(70.0, 50.0, 10.0, 0.0))
    }

    /// Open eyes with the right eye to the left of the left eye
    fn mirrored_face() -> Landmarks {
        Landmarks::from_eye_regions(eye(70.0, 50.0, 10.0, 6.0), eye(30.0, 50.0, 10.0, 6.0))
    }

    fn kinds(alerts: &[Alert]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_open_eyes_no_alerts() {
        let config = BehaviorConfig::default();
        let mut state = BehaviorState::default();
        for _ in 0..20 {
            assert!(analyze(&config, &mut state, &open_face()).unwrap().is_empty());
        }
        assert_eq!(state.eye_closure_frames, 0);
        assert_eq!(state.gaze_history.len(), 10);
    }

    #[test]
    fn test_closure_alert_after_threshold() {
        let config = BehaviorConfig::default();
        let mut state = BehaviorState::default();

        for _ in 0..10 {
            assert!(analyze(&config, &mut state, &closed_face()).unwrap().is_empty());
        }
        // 11th closed frame exceeds the threshold
        let alerts = analyze(&config, &mut state, &closed_face()).unwrap();
        assert_eq!(kinds(&alerts), vec![AlertKind::EyeGazeDeviation]);
        assert_eq!(alerts[0].confidence, 0.7);

        // Repeats while closure persists
        let alerts = analyze(&config, &mut state, &closed_face()).unwrap();
        assert_eq!(kinds(&alerts), vec![AlertKind::EyeGazeDeviation]);
    }

    #[test]
    fn test_open_frame_resets_counter() {
        let config = BehaviorConfig::default();
        let mut state = BehaviorState::default();
        for _ in 0..8 {
            analyze(&config, &mut state, &closed_face()).unwrap();
        }
        analyze(&config, &mut state, &open_face()).unwrap();
        assert_eq!(state.eye_closure_frames, 0);
    }

    #[test]
    fn test_unusual_eye_movement() {
        let config = BehaviorConfig::default();
        let mut state = BehaviorState::default();

        for i in 0..4 {
            let face = if i % 2 == 0 { open_face() } else { mirrored_face() };
            assert!(analyze(&config, &mut state, &face).unwrap().is_empty());
        }
        // Fifth sample: x values [1, -1, 1, -1, 1] -> variance 0.96
        let alerts = analyze(&config, &mut state, &open_face()).unwrap();
        assert_eq!(kinds(&alerts), vec![AlertKind::SuspiciousBehavior]);
        assert_eq!(alerts[0].confidence, 0.6);
    }

    #[test]
    fn test_degenerate_eye_leaves_state_untouched() {
        let config = BehaviorConfig::default();
        let mut state = BehaviorState::default();
        analyze(&config, &mut state, &closed_face()).unwrap();

        let collapsed = [Point::new(1.0, 1.0); 6];
        let degenerate = Landmarks::from_eye_regions(collapsed, collapsed);
        let before = state.clone();
        assert_eq!(analyze(&config, &mut state, &degenerate), Err(BehaviorError::DegenerateEye));
        assert_eq!(state, before);
    }

    #[test]
    fn test_state_serializes() {
        let mut state = BehaviorState::default();
        analyze(&BehaviorConfig::default(), &mut state, &open_face()).unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let restored: BehaviorState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
