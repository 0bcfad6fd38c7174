// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "FEEDCHECK_CONFIG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub url: String,
    /// Retries after the first failed connection attempt.
    pub retry_budget: u32,
    pub retry_delay_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/".to_string(),
            retry_budget: 5,
            retry_delay_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

impl TriggerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub bootstrap_servers: String,
    pub group_id: String,
    pub topic: String,
    pub auto_offset_reset: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "127.0.0.1:9094".to_string(),
            group_id: "consumer".to_string(),
            topic: "package-feeds".to_string(),
            auto_offset_reset: "earliest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrainConfig {
    pub poll_timeout_ms: u64,
    pub idle_timeout_ms: u64,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 2_000,
            idle_timeout_ms: 10_000,
        }
    }
}

impl DrainConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub trigger: TriggerConfig,
    pub broker: BrokerConfig,
    pub drain: DrainConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: FEEDCHECK_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        if !path.is_file() {
            bail!("configuration file not found: {}", path.display());
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("FEEDCHECK_").ignore(&["CONFIG_PATH"]).split("__"));

    let config: AppConfig = figment.extract()?;
    Ok(config)
}
