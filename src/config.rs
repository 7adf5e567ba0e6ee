// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use bluer::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bluetooth::RetryPolicy;
use crate::error::ConfigError;
use crate::moisture::Thresholds;

const APP_DIR: &str = "soil-moisture-monitor";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sensor identity.
    pub device: DeviceConfig,

    /// Health check settings.
    pub monitor: MonitorConfig,

    /// Connect retry policy.
    pub retry: RetryConfig,

    /// Reading interpretation settings.
    pub interpreter: InterpreterConfig,

    /// Alert thresholds. Fixed for the lifetime of the process.
    pub thresholds: Thresholds,

    /// Alert presentation settings.
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// MAC address of the sensor, e.g. "00:23:00:00:5F:1A".
    pub address: String,

    /// RFCOMM channel of the serial port service.
    pub channel: u8,

    /// Power on the adapter if it is off instead of refusing to connect.
    pub power_on_adapter: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: "00:23:00:00:5F:1A".to_string(),
            channel: 1,
            power_on_adapter: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between health checks in milliseconds.
    pub check_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Connect attempts per health tick.
    pub max_attempts: u32,

    /// Delay after the first failed attempt in milliseconds. Zero retries immediately.
    pub initial_delay_ms: u64,

    /// Upper bound on the delay between attempts in milliseconds.
    pub max_delay_ms: u64,

    /// Growth factor applied to the delay after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 0,
            max_delay_ms: 2000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Delay between a message arriving and it being acted upon, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self { debounce_ms: 8000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long an alert stays visible, in milliseconds.
    pub auto_dismiss_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_ms: 5000,
        }
    }
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Load configuration from file or create default.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from `path`, writing the defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.peer_address()?;
        if self.thresholds.low >= self.thresholds.high {
            return Err(ConfigError::InvalidThresholds {
                low: self.thresholds.low,
                high: self.thresholds.high,
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if self.monitor.check_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// Parsed sensor address.
    pub fn peer_address(&self) -> Result<Address, ConfigError> {
        self.device
            .address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.device.address.clone()))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.check_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.interpreter.debounce_ms)
    }

    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_millis(self.notifications.auto_dismiss_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            multiplier: self.retry.multiplier,
        }
    }
}
