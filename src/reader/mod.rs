// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot reading from the appliance.
//!
//! Two interchangeable strategies share the same capability — produce a
//! [`Snapshot`] or fail the cycle:
//!
//! - [`LocalReader`]: the appliance's own request/response protocol over
//!   the local network, one request per data category.
//! - [`CloudReader`]: a single HTTPS request against the vendor cloud
//!   endpoint with basic authentication.
//!
//! The strategy is selected once at startup from the configured mode and
//! never re-branched during the poll loop.

mod cloud;
mod local;

pub use cloud::CloudReader;
pub use local::LocalReader;

use serde_json::{Map, Value};

use crate::config::{Config, Mode};
use crate::error::ReadError;

/// One cycle's worth of appliance data.
///
/// The two mappings are device-defined and opaque to the bridge: they are
/// serialized into the attributes document as-is, never validated, and
/// dropped at the end of the cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Operating data (temperatures, output, state).
    pub operating: Map<String, Value>,
    /// Configured setpoints.
    pub settings: Map<String, Value>,
}

impl Snapshot {
    /// Returns true when both mappings are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operating.is_empty() && self.settings.is_empty()
    }
}

/// The configured read strategy.
#[derive(Debug)]
pub enum Reader {
    /// Local device protocol.
    Local(LocalReader),
    /// Vendor cloud endpoint.
    Cloud(CloudReader),
}

impl Reader {
    /// Builds the strategy selected by the configuration.
    ///
    /// Credentials required by the mode are checked per read, not here:
    /// their absence fails cycles, not the process.
    ///
    /// # Errors
    ///
    /// Returns error if the cloud HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, ReadError> {
        match config.mode {
            Mode::Local => Ok(Self::Local(LocalReader::new(
                config.nbe_host.clone(),
                config.nbe_serial.clone(),
                config.nbe_password.clone(),
            ))),
            Mode::Cloud => Ok(Self::Cloud(CloudReader::new(
                config.nbe_serial.clone(),
                config.cloud_username.clone(),
                config.cloud_password.clone(),
            )?)),
        }
    }

    /// Fetches one snapshot from the appliance.
    ///
    /// # Errors
    ///
    /// Returns error on missing credentials, transport failure, or a
    /// rejected cloud request. No partial snapshot is ever returned.
    pub async fn read(&self) -> Result<Snapshot, ReadError> {
        match self {
            Self::Local(reader) => reader.read().await,
            Self::Cloud(reader) => reader.read().await,
        }
    }

    /// Returns the configured read mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Local(_) => Mode::Local,
            Self::Cloud(_) => Mode::Cloud,
        }
    }

    /// Returns the effective source address, recorded in each cycle's
    /// attributes document.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Local(reader) => reader.host(),
            Self::Cloud(reader) => Some(reader.host()),
        }
    }

    /// Returns the owning-device model string for the discovery
    /// descriptor. The only discovery field that differs between modes.
    #[must_use]
    pub fn model(&self) -> &'static str {
        match self {
            Self::Local(_) => "NBE burner/boiler",
            Self::Cloud(_) => "NBE burner/boiler (StokerCloud)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config(host: Option<&str>) -> Config {
        let mut doc = serde_json::json!({"nbe_serial": "1234", "nbe_password": "0000"});
        if let Some(host) = host {
            doc["nbe_host"] = host.into();
        }
        serde_json::from_value(doc).unwrap()
    }

    #[test]
    fn empty_snapshot() {
        assert!(Snapshot::default().is_empty());
    }

    #[test]
    fn snapshot_with_one_mapping_is_not_empty() {
        let mut operating = Map::new();
        operating.insert("boiler_temp".to_string(), Value::from(74.5));
        let snapshot = Snapshot {
            operating,
            settings: Map::new(),
        };
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn local_reader_source_and_model() {
        let reader = Reader::from_config(&local_config(Some("10.0.0.5"))).unwrap();
        assert_eq!(reader.mode(), Mode::Local);
        assert_eq!(reader.source(), Some("10.0.0.5"));
        assert_eq!(reader.model(), "NBE burner/boiler");
    }

    #[test]
    fn local_reader_without_host_has_no_source() {
        let reader = Reader::from_config(&local_config(None)).unwrap();
        assert_eq!(reader.source(), None);
    }

    #[test]
    fn cloud_reader_source_and_model() {
        let config: Config = serde_json::from_value(
            serde_json::json!({"nbe_serial": "1234", "mode": "cloud"}),
        )
        .unwrap();
        let reader = Reader::from_config(&config).unwrap();
        assert_eq!(reader.mode(), Mode::Cloud);
        assert_eq!(reader.source(), Some("stokercloud.dk"));
        assert_eq!(reader.model(), "NBE burner/boiler (StokerCloud)");
    }
}
