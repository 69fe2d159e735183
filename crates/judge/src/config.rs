use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::{JudgeError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeConfig {
    #[serde(default)]
    pub judge: JudgeEndpointConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            judge: JudgeEndpointConfig::default(),
            polling: PollingConfig::default(),
            limits: LimitsConfig::default(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

impl JudgeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            JudgeError::Config(format!("failed to read config file {}: {err}", path.display()))
        })?;
        Self::from_str(&content).map_err(|err| match err {
            JudgeError::Config(message) => {
                JudgeError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Loads `path`, falling back to the built-in defaults when it does not exist.
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)
            .map_err(|err| JudgeError::Config(format!("failed to deserialize judge config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(JudgeError::Config(
                "event_buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.polling.interval_ms == 0 || self.polling.max_ticks == 0 {
            return Err(JudgeError::Config(
                "polling interval_ms and max_ticks must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// External judge endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeEndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `x-rapidapi-host` when present.
    #[serde(default)]
    pub api_host: Option<String>,
    /// Sent as `x-rapidapi-key` when present.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_true")]
    pub base64_encoded: bool,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for JudgeEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_host: None,
            api_key: None,
            base64_encoded: true,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl JudgeEndpointConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// The judging deadline is `interval_ms * max_ticks` after dispatch.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
    #[serde(default = "default_compile_check_interval_ms")]
    pub compile_check_interval_ms: u64,
    #[serde(default = "default_compile_check_timeout_ms")]
    pub compile_check_timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_ticks: default_max_ticks(),
            compile_check_interval_ms: default_compile_check_interval_ms(),
            compile_check_timeout_ms: default_compile_check_timeout_ms(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        self.interval() * self.max_ticks
    }

    pub fn compile_check_interval(&self) -> Duration {
        Duration::from_millis(self.compile_check_interval_ms)
    }

    pub fn compile_check_timeout(&self) -> Duration {
        Duration::from_millis(self.compile_check_timeout_ms)
    }
}

/// Clamps applied to problem limits before they reach the judge.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_time_limit_secs")]
    pub max_time_limit_secs: f64,
    #[serde(default = "default_min_memory_limit_kb")]
    pub min_memory_limit_kb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_time_limit_secs: default_max_time_limit_secs(),
            min_memory_limit_kb: default_min_memory_limit_kb(),
        }
    }
}

impl LimitsConfig {
    /// Problem time limit (milliseconds) as judge CPU seconds.
    pub fn cpu_time_limit(&self, time_limit_ms: u64) -> f64 {
        (time_limit_ms as f64 / 1000.0).min(self.max_time_limit_secs)
    }

    pub fn memory_limit(&self, memory_limit_kb: u64) -> u64 {
        memory_limit_kb.max(self.min_memory_limit_kb)
    }
}

fn default_event_buffer_size() -> usize {
    1_000
}

fn default_base_url() -> String {
    "http://127.0.0.1:2358".to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_interval_ms() -> u64 {
    5_000
}

fn default_max_ticks() -> u32 {
    10
}

fn default_compile_check_interval_ms() -> u64 {
    1_500
}

fn default_compile_check_timeout_ms() -> u64 {
    15_000
}

fn default_max_time_limit_secs() -> f64 {
    15.0
}

fn default_min_memory_limit_kb() -> u64 {
    2_048
}
