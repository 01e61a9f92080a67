//! Presence Monitoring
//!
//! Debounced state machine over the per-frame face count. A condition
//! (no face, multiple faces) must hold continuously for its threshold
//! before an alert is raised, and keeps alerting while it persists.
//! Elapsed time comes from frame timestamps only.

use alerting::Alert;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Presence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Continuous absence before NO_FACE (milliseconds)
    pub no_face_threshold_ms: u64,

    /// Continuous crowding before MULTIPLE_FACES (milliseconds)
    pub multiple_faces_threshold_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            no_face_threshold_ms: 3000,
            multiple_faces_threshold_ms: 5000,
        }
    }
}

impl PresenceConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            no_face_threshold_ms: 2000,
            multiple_faces_threshold_ms: 3000,
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            no_face_threshold_ms: 5000,
            multiple_faces_threshold_ms: 8000,
        }
    }
}

/// Presence status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PresenceStatus {
    #[default]
    Normal,
    NoFaceTiming,
    MultipleFacesTiming,
}

/// Per-session debounce timers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceState {
    /// Timestamp the current absence started
    pub no_face_since: Option<u64>,

    /// Timestamp the current crowding started
    pub multiple_faces_since: Option<u64>,
}

impl PresenceState {
    pub fn status(&self) -> PresenceStatus {
        match (self.no_face_since, self.multiple_faces_since) {
            (Some(_), _) => PresenceStatus::NoFaceTiming,
            (None, Some(_)) => PresenceStatus::MultipleFacesTiming,
            (None, None) => PresenceStatus::Normal,
        }
    }

    /// Feed one frame's face count; returns the presence alerts for it
    pub fn update(
        &mut self,
        config: &PresenceConfig,
        face_count: usize,
        timestamp_ms: u64,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        match face_count {
            0 => {
                self.multiple_faces_since = None;
                match self.no_face_since {
                    None => {
                        debug!("No face at {}ms, starting timer", timestamp_ms);
                        self.no_face_since = Some(timestamp_ms);
                    }
                    Some(since) if elapsed(since, timestamp_ms) >= config.no_face_threshold_ms => {
                        alerts.push(Alert::no_face());
                    }
                    Some(_) => {}
                }
            }
            1 => {
                self.no_face_since = None;
                self.multiple_faces_since = None;
            }
            count => {
                self.no_face_since = None;
                match self.multiple_faces_since {
                    None => {
                        debug!("{} faces at {}ms, starting timer", count, timestamp_ms);
                        self.multiple_faces_since = Some(timestamp_ms);
                    }
                    Some(since)
                        if elapsed(since, timestamp_ms) >= config.multiple_faces_threshold_ms =>
                    {
                        alerts.push(Alert::multiple_faces(count));
                    }
                    Some(_) => {}
                }
            }
        }

        alerts
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Elapsed time, zero when the clock went backwards
fn elapsed(since: u64, now: u64) -> u64 {
    now.saturating_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlertKind;
    use proptest::prelude::*;

    fn kinds(alerts: &[Alert]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_no_face_debounce() {
        let config = PresenceConfig::default();
        let mut state = PresenceState::default();

        assert!(state.update(&config, 0, 0).is_empty());
        assert_eq!(state.status(), PresenceStatus::NoFaceTiming);
        assert!(state.update(&config, 0, 2999).is_empty());

        let alerts = state.update(&config, 0, 3000);
        assert_eq!(kinds(&alerts), vec![AlertKind::NoFace]);
        assert_eq!(alerts[0].confidence, 0.8);

        // Keeps firing while absent
        assert_eq!(kinds(&state.update(&config, 0, 3500)), vec![AlertKind::NoFace]);
    }

    #[test]
    fn test_single_face_clears_timers() {
        let config = PresenceConfig::default();
        let mut state = PresenceState::default();

        state.update(&config, 0, 0);
        state.update(&config, 0, 2500);
        assert!(state.update(&config, 1, 2600).is_empty());
        assert_eq!(state.status(), PresenceStatus::Normal);

        // Timer restarts from the next absence
        assert!(state.update(&config, 0, 3000).is_empty());
        assert!(state.update(&config, 0, 5999).is_empty());
        assert_eq!(kinds(&state.update(&config, 0, 6000)), vec![AlertKind::NoFace]);
    }

    #[test]
    fn test_multiple_faces_six_frames() {
        let config = PresenceConfig::default();
        let mut state = PresenceState::default();

        let mut fired = Vec::new();
        for i in 0..6u64 {
            let alerts = state.update(&config, 2, i * 1000);
            fired.push(!alerts.is_empty());
        }
        assert_eq!(fired, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_multiple_faces_alert_content() {
        let config = PresenceConfig::default();
        let mut state = PresenceState::default();
        state.update(&config, 3, 0);

        let alerts = state.update(&config, 3, 5000);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].description, "Multiple faces detected (3)");
        assert_eq!(alerts[0].confidence, 0.9);
    }

    #[test]
    fn test_conditions_clear_each_other() {
        let config = PresenceConfig::default();
        let mut state = PresenceState::default();

        state.update(&config, 0, 0);
        state.update(&config, 2, 1000);
        assert_eq!(state.no_face_since, None);
        assert_eq!(state.multiple_faces_since, Some(1000));

        state.update(&config, 0, 2000);
        assert_eq!(state.multiple_faces_since, None);
        assert_eq!(state.no_face_since, Some(2000));
    }

    #[test]
    fn test_backwards_timestamp_counts_as_zero() {
        let config = PresenceConfig::default();
        let mut state = PresenceState::default();
        state.update(&config, 0, 10_000);
        assert!(state.update(&config, 0, 0).is_empty());
        assert_eq!(state.no_face_since, Some(10_000));
    }

    #[test]
    fn test_state_serializes() {
        let mut state = PresenceState::default();
        state.update(&PresenceConfig::default(), 0, 42);
        let json = serde_json::to_string(&state).unwrap();
        let restored: PresenceState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }

    proptest! {
        #[test]
        fn prop_never_both_timers(counts in prop::collection::vec(0usize..4, 1..40)) {
            let config = PresenceConfig::default();
            let mut state = PresenceState::default();
            for (i, count) in counts.into_iter().enumerate() {
                state.update(&config, count, i as u64 * 500);
                prop_assert!(state.no_face_since.is_none() || state.multiple_faces_since.is_none());
            }
        }

        #[test]
        fn prop_single_face_never_alerts(
            timestamps in prop::collection::vec(0u64..100_000, 1..20),
        ) {
            let config = PresenceConfig::default();
            let mut state = PresenceState::default();
            for ts in timestamps {
                prop_assert!(state.update(&config, 1, ts).is_empty());
            }
        }
    }
}
