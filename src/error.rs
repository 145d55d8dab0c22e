// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! The taxonomy follows the process lifecycle: configuration errors are
//! fatal and abort startup, read and publish errors are confined to the
//! cycle they occur in.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Error while loading or validating the configuration document.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error while reading a snapshot from the appliance.
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// Error while talking to the MQTT broker.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
}

/// Errors raised while loading the configuration document.
///
/// All of these are fatal: the process exits non-zero before any bus
/// connection is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON or misses a
    /// mandatory key.
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The poll interval must be a positive number of seconds.
    #[error("interval must be a positive number of seconds")]
    ZeroInterval,
}

/// Errors raised while fetching a snapshot from the appliance.
///
/// Every variant fails the current poll cycle; none of them terminates
/// the process, and the cycle is retried after the normal interval.
#[derive(Debug, Error)]
pub enum ReadError {
    /// A setting required by the selected read mode is absent.
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    /// Socket-level failure talking to the appliance.
    #[error("device request failed: {0}")]
    Io(#[from] std::io::Error),

    /// The appliance did not answer within the read timeout.
    #[error("device did not answer within {0} s")]
    Timeout(u64),

    /// HTTP transport failure talking to the cloud endpoint.
    #[error("cloud request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The cloud endpoint answered with a non-success status.
    #[error("cloud request failed with HTTP {0}")]
    Status(u16),
}

/// Errors raised while establishing or using the MQTT connection.
#[derive(Debug, Error)]
pub enum PublishError {
    /// MQTT client-side failure (queue closed, protocol violation).
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The broker connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A bus payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_setting_display() {
        let err = ReadError::MissingSetting("nbe_host");
        assert_eq!(err.to_string(), "missing required setting: nbe_host");
    }

    #[test]
    fn status_display() {
        let err = ReadError::Status(503);
        assert_eq!(err.to_string(), "cloud request failed with HTTP 503");
    }

    #[test]
    fn error_from_read_error() {
        let read_err = ReadError::Timeout(5);
        let err: Error = read_err.into();
        assert!(matches!(err, Error::Read(ReadError::Timeout(5))));
        assert_eq!(
            err.to_string(),
            "read error: device did not answer within 5 s"
        );
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::ZeroInterval;
        assert_eq!(
            err.to_string(),
            "interval must be a positive number of seconds"
        );
    }
}
