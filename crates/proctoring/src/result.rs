//! Frame analysis result

use std::collections::BTreeSet;

use alerting::{Alert, AlertKind};
use serde::{Deserialize, Serialize};

/// Which pipeline profile produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Identity, behavior, objects, and presence
    #[default]
    Full,
    /// Presence monitoring only
    Basic,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Full => "full",
            AnalysisMode::Basic => "basic",
        }
    }
}

/// Result of analyzing one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAnalysisResult {
    /// Alerts in emission order
    pub alerts: Vec<Alert>,
    pub face_detected: bool,
    pub face_count: usize,
    /// Session-level flag, latched on first match
    pub identity_verified: bool,
    /// Faces in this frame that matched the reference
    pub identity_matches: usize,
    pub objects_detected: BTreeSet<String>,
    /// Frame timestamp (milliseconds)
    pub timestamp: u64,
    pub mode: AnalysisMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameAnalysisResult {
    /// Result for a frame that could not be analyzed
    pub fn failed(timestamp: u64, mode: AnalysisMode, error: impl Into<String>) -> Self {
        Self {
            timestamp,
            mode,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn has_alert(&self, kind: AlertKind) -> bool {
        self.alerts.iter().any(|a| a.kind == kind)
    }

    pub fn alert_kinds(&self) -> Vec<AlertKind> {
        self.alerts.iter().map(|a| a.kind).collect()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
