use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use collector_client::GatewaySettings;
use collector_core::TaskConfig;

/// Page default from the hosting task template.
const DEFAULT_MIN_SAMPLES: u32 = 5;
/// Observed cadence of the session-wide aggregate poll.
const DEFAULT_STATS_POLL_SECS: u64 = 10;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "cannot read task file: {err}"),
            ConfigError::Parse(detail) => write!(f, "cannot parse task file: {detail}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Gather N good urls, batch-verified for duplicates before finish.
    Gather,
    /// Beat-the-machine: server validates everything, points per sample.
    Btm,
    /// Label matching: only matches score.
    Matching,
}

/// RON task description handed to the app by the hosting page.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskFile {
    pub core_url: String,
    pub job_id: String,
    pub worker_id: String,
    pub variant: Variant,
    #[serde(default)]
    pub min_samples: Option<u32>,
    #[serde(default)]
    pub max_samples: Option<u32>,
    /// Expected label applied to every submission in matching tasks.
    #[serde(default)]
    pub label: Option<String>,
    /// Zero disables the aggregate poll.
    #[serde(default)]
    pub stats_poll_secs: Option<u64>,
}

impl TaskFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        ron::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn task_config(&self) -> TaskConfig {
        let min = self.min_samples.unwrap_or(DEFAULT_MIN_SAMPLES);
        let mut config = match self.variant {
            Variant::Gather => TaskConfig::threshold_gather(min),
            Variant::Btm => TaskConfig::beat_the_machine(min),
            Variant::Matching => TaskConfig::label_matching(min),
        };
        config.max_allowed = self.max_samples;
        config
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings::new(
            self.core_url.clone(),
            self.job_id.clone(),
            self.worker_id.clone(),
        )
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        let secs = self.stats_poll_secs.unwrap_or(match self.variant {
            Variant::Btm => DEFAULT_STATS_POLL_SECS,
            Variant::Gather | Variant::Matching => 0,
        });
        (secs > 0).then(|| Duration::from_secs(secs))
    }
}
