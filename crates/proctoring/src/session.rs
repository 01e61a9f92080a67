//! Per-participant session state

use alerting::{Alert, AlertSummary};
use behavior::BehaviorState;
use frame_capture::SessionIds;
use identity::ReferenceIdentity;
use presence::{PresenceState, PresenceStatus};
use serde::{Deserialize, Serialize};

use crate::ProctorConfig;

/// Everything the pipeline remembers about one monitored participant.
///
/// Owned by exactly one caller and passed by `&mut` into the engine.
/// Serializable so a transport can persist it between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    ids: SessionIds,
    config: ProctorConfig,
    reference: Option<ReferenceIdentity>,
    identity_verified: bool,
    pub(crate) presence: PresenceState,
    pub(crate) behavior: BehaviorState,
    frames_analyzed: u64,
    summary: AlertSummary,
}

impl SessionState {
    pub fn new(ids: SessionIds, config: ProctorConfig) -> Self {
        Self {
            behavior: BehaviorState::new(&config.behavior),
            ids,
            config,
            reference: None,
            identity_verified: false,
            presence: PresenceState::default(),
            frames_analyzed: 0,
            summary: AlertSummary::default(),
        }
    }

    pub fn ids(&self) -> &SessionIds {
        &self.ids
    }

    /// Fill in identifiers the session was created without
    pub fn refresh_ids(&mut self, ids: &SessionIds) {
        if self.ids.meeting_id.is_empty() && !ids.meeting_id.is_empty() {
            self.ids.meeting_id = ids.meeting_id.clone();
        }
        if self.ids.user_id.is_none() {
            self.ids.user_id = ids.user_id.clone();
        }
    }

    /// Thresholds fixed at session creation
    pub fn config(&self) -> &ProctorConfig {
        &self.config
    }

    pub fn reference(&self) -> Option<&ReferenceIdentity> {
        self.reference.as_ref()
    }

    pub fn is_enrolled(&self) -> bool {
        self.reference.is_some()
    }

    /// Replace the enrolled reference
    pub fn set_reference(&mut self, reference: ReferenceIdentity) {
        self.reference = Some(reference);
    }

    /// True once any face has matched the reference in this session
    pub fn identity_verified(&self) -> bool {
        self.identity_verified
    }

    /// Latch the verified flag; returns true on the first transition
    pub(crate) fn mark_verified(&mut self) -> bool {
        !std::mem::replace(&mut self.identity_verified, true)
    }

    pub fn presence(&self) -> &PresenceState {
        &self.presence
    }

    pub fn presence_status(&self) -> PresenceStatus {
        self.presence.status()
    }

    pub fn behavior(&self) -> &BehaviorState {
        &self.behavior
    }

    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed
    }

    /// Running summary of every alert raised in this session
    pub fn summary(&self) -> &AlertSummary {
        &self.summary
    }

    pub(crate) fn record_frame(&mut self, alerts: &[Alert]) {
        self.frames_analyzed += 1;
        self.summary.extend(alerts);
    }
}
