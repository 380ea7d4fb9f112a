//! Configuration Management
//!
//! Loads and manages tutorkit configuration from TOML files.
//! Configuration includes:
//! - AI endpoint settings (base URL, model selection, token limits)
//! - Gateway behavior (queue spacing, retry/backoff policy)
//! - Scheduler behavior (poll cadence, trigger tolerance)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub api_key: Option<String>,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// AI gateway queue and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Fixed spacing between queued AI calls (ms). Caps outbound throughput
    /// to one call per interval.
    #[serde(default = "default_queue_delay")]
    pub queue_delay_ms: u64,
    /// Total attempts per unit of work when rate limited (first try included).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff (ms); attempt n waits `2^n * base`.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Cap on any single backoff delay (ms).
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// HTTP request timeout (secs).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            queue_delay_ms: default_queue_delay(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl GatewayConfig {
    pub fn queue_delay(&self) -> Duration {
        Duration::from_millis(self.queue_delay_ms)
    }
}

/// Question scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Playback position sampling cadence (ms).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// A question triggers when |position - timestamp| < tolerance (secs).
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            tolerance_secs: default_tolerance(),
        }
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key: None,
            gateway: GatewayConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8000/v1".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_max_tokens() -> usize {
    2048
}
fn default_temperature() -> f32 {
    0.7
}
fn default_queue_delay() -> u64 {
    1000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}
fn default_request_timeout() -> u64 {
    60
}
fn default_poll_interval() -> u64 {
    1000
}
fn default_tolerance() -> f64 {
    2.0
}

impl Config {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config from {}", p))?;
                toml::from_str(&content).context("Failed to parse config")?
            }
            None => match std::fs::read_to_string("tutorkit.toml") {
                Ok(content) => toml::from_str(&content).context("Failed to parse config")?,
                Err(_) => Self::default(),
            },
        };

        // Override with environment variables
        if let Ok(endpoint) = std::env::var("TUTORKIT_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("TUTORKIT_MODEL") {
            config.model = model;
        }
        if let Ok(api_key) = std::env::var("TUTORKIT_API_KEY") {
            config.api_key = Some(api_key);
        }
        if let Ok(max_tokens) = std::env::var("TUTORKIT_MAX_TOKENS") {
            if let Ok(n) = max_tokens.parse::<usize>() {
                config.max_tokens = n;
            }
        }
        if let Ok(temp) = std::env::var("TUTORKIT_TEMPERATURE") {
            if let Ok(t) = temp.parse::<f32>() {
                config.temperature = t;
            }
        }

        Ok(config)
    }
}
