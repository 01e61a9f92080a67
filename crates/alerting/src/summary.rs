//! Running alert summary and risk scoring

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Alert, AlertKind, Severity};

/// Participant risk level derived from alert volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_count(alert_count: usize) -> Self {
        match alert_count {
            0 => RiskLevel::Low,
            1..=2 => RiskLevel::Medium,
            3..=5 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

/// Aggregated view over a stream of alerts.
///
/// Every alert is counted, but only violations (non-informational
/// severities) drive the risk score and level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub total: usize,
    /// Alerts above informational severity
    pub violations: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_kind: BTreeMap<AlertKind, usize>,
    /// Sum of severity weight x confidence over violations
    weighted_sum: f32,
}

impl AlertSummary {
    pub fn from_alerts<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Self {
        let mut summary = Self::default();
        summary.extend(alerts);
        summary
    }

    /// Record one alert
    pub fn record(&mut self, alert: &Alert) {
        self.total += 1;
        *self.by_severity.entry(alert.severity).or_insert(0) += 1;
        *self.by_kind.entry(alert.kind).or_insert(0) += 1;
        if !alert.severity.is_informational() {
            self.violations += 1;
            self.weighted_sum += alert.severity.weight() * alert.confidence;
        }
    }

    pub fn extend<'a>(&mut self, alerts: impl IntoIterator<Item = &'a Alert>) {
        for alert in alerts {
            self.record(alert);
        }
    }

    /// Mean weighted confidence of violations, capped at 1.0
    pub fn risk_score(&self) -> f32 {
        if self.violations == 0 {
            return 0.0;
        }
        (self.weighted_sum / self.violations as f32).min(1.0)
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_count(self.violations)
    }

    /// Most frequent violation kind; ties go to the earlier kind
    pub fn most_common(&self) -> Option<AlertKind> {
        self.by_kind
            .iter()
            .filter(|(kind, _)| !kind.severity().is_informational())
            .fold(None, |best: Option<(AlertKind, usize)>, (&kind, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((kind, count)),
            })
            .map(|(kind, _)| kind)
    }

    pub fn count_of(&self, kind: AlertKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}
