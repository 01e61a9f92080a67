//! Exam Proctoring Pipeline
//!
//! Turns per-frame detections into a debounced stream of typed alerts:
//! - Identity verification against an enrolled reference face
//! - Eye-closure and gaze anomaly detection
//! - No-face / multiple-faces presence monitoring
//! - Prohibited object alerts
//!
//! The engine itself is stateless; each monitored participant owns a
//! [`SessionState`] that is passed into every call.

mod aggregator;
pub mod config;
pub mod deepfake;
pub mod engine;
pub mod result;
pub mod session;

pub use config::ProctorConfig;
pub use deepfake::{screen, ClassifierError, DeepfakeClassifier, DeepfakeVerdict};
pub use engine::ProctoringEngine;
pub use result::{AnalysisMode, FrameAnalysisResult};
pub use session::SessionState;

pub use alerting::{Alert, AlertKind, AlertSummary, RiskLevel, Severity};
pub use identity::{EnrollmentError, ReferenceIdentity};

use thiserror::Error;

/// Configuration error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
