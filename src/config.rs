// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration loading.
//!
//! The bridge reads a single JSON document at startup. The path comes
//! from the `NBE_CONFIG` environment variable and falls back to
//! `/app/config.json` (the add-on container location). Loading is the
//! only filesystem access the process performs.
//!
//! Only `nbe_serial` is mandatory; everything else has a default or is
//! checked lazily by the read strategy that needs it, so that a missing
//! credential degrades to failed cycles instead of a dead process.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_VAR: &str = "NBE_CONFIG";

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/app/config.json";

/// Where a snapshot is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Read from the appliance on the local network.
    #[default]
    Local,
    /// Read from the vendor cloud endpoint.
    Cloud,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Cloud => write!(f, "cloud"),
        }
    }
}

/// Immutable bridge configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Read mode selector.
    #[serde(default)]
    pub mode: Mode,

    /// Appliance address on the local network (local mode).
    #[serde(default)]
    pub nbe_host: Option<String>,

    /// Appliance serial number. Mandatory in all modes; accepts a JSON
    /// number or string.
    #[serde(deserialize_with = "string_or_number")]
    pub nbe_serial: String,

    /// Appliance access PIN (local mode).
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub nbe_password: Option<String>,

    /// Vendor cloud account name (cloud mode).
    #[serde(default)]
    pub cloud_username: Option<String>,

    /// Vendor cloud account password (cloud mode).
    #[serde(default)]
    pub cloud_password: Option<String>,

    /// MQTT broker host.
    #[serde(default = "default_mqtt_host")]
    pub mqtt_host: String,

    /// MQTT broker port.
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,

    /// MQTT username; an empty string counts as absent.
    #[serde(default)]
    pub mqtt_user: Option<String>,

    /// MQTT password.
    #[serde(default)]
    pub mqtt_password: Option<String>,

    /// Discovery topic prefix.
    #[serde(default = "default_mqtt_prefix")]
    pub mqtt_prefix: String,

    /// Poll interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_mqtt_host() -> String {
    "core-mosquitto".to_string()
}

const fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_prefix() -> String {
    "homeassistant".to_string()
}

const fn default_interval() -> u64 {
    15
}

impl Config {
    /// Loads and validates the configuration from the given path.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON,
    /// misses `nbe_serial`, or carries a zero poll interval.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or invalid.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if config.interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(config)
    }

    /// Returns the MQTT credentials, if a non-empty username is set.
    #[must_use]
    pub fn mqtt_credentials(&self) -> Option<(&str, &str)> {
        let user = self.mqtt_user.as_deref().filter(|u| !u.is_empty())?;
        Some((user, self.mqtt_password.as_deref().unwrap_or_default()))
    }

    /// Returns the poll interval as a [`Duration`].
    #[must_use]
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

/// Returns the configuration file path, honoring the env override.
#[must_use]
pub fn config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// JSON value that is either a string or a number, coerced to a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(i64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(Into::into)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(Into::into))
}
