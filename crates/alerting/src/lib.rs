//! Alerting System
//!
//! Provides the stable alert wire types, per-kind severity mapping,
//! and risk summaries over collected alerts.

mod alert;
mod summary;

pub use alert::{Alert, AlertKind, Severity};
pub use summary::{AlertSummary, RiskLevel};
