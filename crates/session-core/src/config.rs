//! Controller configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::MediaConstraints;

/// Timing and policy knobs for the negotiation controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Upper bound on candidate gathering before the code is produced anyway
    pub gather_timeout_ms: u64,

    /// How long a guest waits for connection evidence after its answer
    pub connect_fallback_ms: u64,

    /// Delay before the single retry of a remote answer
    pub answer_retry_delay_ms: u64,

    /// Lifetime of a transient warning
    pub warning_dismiss_ms: u64,

    /// Pasted text shorter than this (after trimming) is ignored
    pub min_paste_len: usize,

    /// Let the guest fallback enter Connected on stable signaling alone
    pub assume_connected_when_stable: bool,

    pub preferred_constraints: MediaConstraints,

    /// Retried once when the preferred constraints fail
    pub fallback_constraints: MediaConstraints,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            gather_timeout_ms: 10_000,
            connect_fallback_ms: 15_000,
            answer_retry_delay_ms: 1_000,
            warning_dismiss_ms: 5_000,
            min_paste_len: 16,
            assume_connected_when_stable: true,
            preferred_constraints: MediaConstraints::AUDIO_VIDEO,
            fallback_constraints: MediaConstraints::AUDIO_ONLY,
        }
    }
}

impl ControllerConfig {
    pub fn gather_timeout(&self) -> Duration {
        Duration::from_millis(self.gather_timeout_ms)
    }

    pub fn connect_fallback(&self) -> Duration {
        Duration::from_millis(self.connect_fallback_ms)
    }

    pub fn answer_retry_delay(&self) -> Duration {
        Duration::from_millis(self.answer_retry_delay_ms)
    }

    pub fn warning_dismiss(&self) -> Duration {
        Duration::from_millis(self.warning_dismiss_ms)
    }

    pub fn with_gather_timeout(mut self, timeout: Duration) -> Self {
        self.gather_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_connect_fallback(mut self, timeout: Duration) -> Self {
        self.connect_fallback_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_answer_retry_delay(mut self, delay: Duration) -> Self {
        self.answer_retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_assume_connected_when_stable(mut self, enabled: bool) -> Self {
        self.assume_connected_when_stable = enabled;
        self
    }

    pub fn with_constraints(mut self, preferred: MediaConstraints, fallback: MediaConstraints) -> Self {
        self.preferred_constraints = preferred;
        self.fallback_constraints = fallback;
        self
    }

    /// Check the configuration for values the controller cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timers = [
            ("gather_timeout_ms", self.gather_timeout_ms),
            ("connect_fallback_ms", self.connect_fallback_ms),
            ("answer_retry_delay_ms", self.answer_retry_delay_ms),
            ("warning_dismiss_ms", self.warning_dismiss_ms),
        ];
        if let Some((name, _)) = timers.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
        }
        if self.preferred_constraints.is_empty() || self.fallback_constraints.is_empty() {
            return Err(ConfigError::Invalid(
                "capture constraints must request at least one track".into(),
            ));
        }
        if self.min_paste_len == 0 {
            return Err(ConfigError::Invalid("min_paste_len must be non-zero".into()));
        }
        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Some("toml") => Self::from_toml_str(&contents)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Defaults with `QRLINK_*` millisecond overrides from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `QRLINK_*_MS` environment overrides on top of this configuration
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        let overrides: [(&str, &mut u64); 4] = [
            ("QRLINK_GATHER_TIMEOUT_MS", &mut self.gather_timeout_ms),
            ("QRLINK_CONNECT_FALLBACK_MS", &mut self.connect_fallback_ms),
            ("QRLINK_ANSWER_RETRY_DELAY_MS", &mut self.answer_retry_delay_ms),
            ("QRLINK_WARNING_DISMISS_MS", &mut self.warning_dismiss_ms),
        ];
        for (name, slot) in overrides {
            if let Ok(value) = std::env::var(name) {
                *slot = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Parse(format!("{}={}", name, value)))?;
            }
        }
        self.validate()?;
        Ok(self)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}
