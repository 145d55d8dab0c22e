// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus topic layout and the Home Assistant discovery descriptor.
//!
//! One sensor per appliance, addressed as `nbe_<serial>`. All four
//! topics live under `<prefix>/sensor/nbe_<serial>/status/`:
//!
//! - `config` — retained discovery descriptor
//! - `state` — `online`/`offline`, transient
//! - `attributes` — JSON attributes document, transient
//! - `availability` — `{"available": bool}`, retained, last-will target
//!
//! The descriptor is derived once at startup and immutable afterwards;
//! switching read mode with the same serial changes only the device
//! `model` field, never a topic name.

use serde::Serialize;

/// Topic set for one bridged appliance.
#[derive(Debug, Clone)]
pub struct Topics {
    device_id: String,
    /// Retained discovery descriptor topic.
    pub config: String,
    /// `online`/`offline` state topic.
    pub state: String,
    /// JSON attributes topic.
    pub attributes: String,
    /// Availability topic, also the last-will target.
    pub availability: String,
}

impl Topics {
    /// Derives the topic set from the discovery prefix and serial.
    #[must_use]
    pub fn new(prefix: &str, serial: &str) -> Self {
        let device_id = format!("nbe_{serial}");
        let base = format!("{prefix}/sensor/{device_id}/status");
        Self {
            config: format!("{base}/config"),
            state: format!("{base}/state"),
            attributes: format!("{base}/attributes"),
            availability: format!("{base}/availability"),
            device_id,
        }
    }

    /// Returns the device id (`nbe_<serial>`).
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// Owning-device metadata inside the discovery descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    /// Device identifiers, here always `[nbe_<serial>]`.
    pub identifiers: Vec<String>,
    /// Manufacturer display name.
    pub manufacturer: String,
    /// Model display name; the only field that depends on the read mode.
    pub model: String,
    /// Device display name.
    pub name: String,
}

/// Retained discovery descriptor for the status sensor.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryPayload {
    /// Sensor display name.
    pub name: String,
    /// Unique id (`nbe_<serial>_status`).
    pub unique_id: String,
    /// Topic carrying `online`/`offline`.
    pub state_topic: String,
    /// Topic carrying the JSON attributes document.
    pub json_attributes_topic: String,
    /// Topic carrying the availability payload.
    pub availability_topic: String,
    /// Sensor icon.
    pub icon: String,
    /// Owning-device metadata.
    pub device: DeviceInfo,
}

impl DiscoveryPayload {
    /// Builds the descriptor for the given appliance.
    #[must_use]
    pub fn new(serial: &str, model: &str, topics: &Topics) -> Self {
        Self {
            name: format!("NBE {serial} status"),
            unique_id: format!("{}_status", topics.device_id()),
            state_topic: topics.state.clone(),
            json_attributes_topic: topics.attributes.clone(),
            availability_topic: topics.availability.clone(),
            icon: "mdi:fire".to_string(),
            device: DeviceInfo {
                identifiers: vec![topics.device_id().to_string()],
                manufacturer: "NBE".to_string(),
                model: model.to_string(),
                name: format!("NBE {serial}"),
            },
        }
    }
}
