//! Worker settings

use std::time::Duration;

use anyhow::Context;
use proctoring::ProctorConfig;
use serde::{Deserialize, Serialize};

/// Environment variable prefix; nesting uses `__`
pub const ENV_PREFIX: &str = "PROCTOR";

/// Worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Upper bound on one frame's analysis (milliseconds)
    pub frame_timeout_ms: u64,

    /// Upper bound on fetching and enrolling a reference image (milliseconds)
    pub reference_timeout_ms: u64,

    /// Emit logs as JSON
    pub log_json: bool,

    /// Pipeline thresholds and model paths
    #[serde(flatten)]
    pub proctor: ProctorConfig,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            frame_timeout_ms: 2000,
            reference_timeout_ms: 10_000,
            log_json: false,
            proctor: ProctorConfig::default(),
        }
    }
}

impl WorkerSettings {
    /// Defaults, then an optional TOML file, then `PROCTOR__*` variables
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("detection.object_labels")
                .try_parsing(true),
        );

        let settings: WorkerSettings = builder
            .build()
            .context("Failed to read worker configuration")?
            .try_deserialize()
            .context("Invalid worker configuration")?;

        settings.proctor.validate()?;
        Ok(settings)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn reference_timeout(&self) -> Duration {
        Duration::from_millis(self.reference_timeout_ms)
    }
}
