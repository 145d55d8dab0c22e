// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `nbe2mqtt` - bridges NBE pellet burner telemetry to MQTT.
//!
//! The bridge polls an NBE burner/boiler at a fixed interval - either
//! over the appliance's local network protocol or through the
//! StokerCloud HTTPS endpoint - and republishes each reading as Home
//! Assistant-discoverable state, attribute, and availability messages.
//!
//! # Architecture
//!
//! - [`config`]: the JSON configuration document, loaded once.
//! - [`reader`]: the two read strategies behind one [`Reader`] value,
//!   selected at startup.
//! - [`discovery`]: topic layout and the retained discovery descriptor.
//! - [`publisher`]: the MQTT connection, its background event-loop
//!   task, and all publish calls.
//! - [`bridge`]: the poll loop tying the above together.
//!
//! # Quick Start
//!
//! ```no_run
//! use nbe2mqtt::{Config, DiscoveryPayload, Publisher, Reader, Topics};
//!
//! # async fn example() -> nbe2mqtt::Result<()> {
//! let config = Config::load("/app/config.json")?;
//! let reader = Reader::from_config(&config)?;
//! let topics = Topics::new(&config.mqtt_prefix, &config.nbe_serial);
//! let discovery = DiscoveryPayload::new(&config.nbe_serial, reader.model(), &topics);
//!
//! let source = reader.source().map(String::from);
//! let publisher = Publisher::connect(&config, topics, source).await?;
//! publisher.announce(&discovery).await?;
//!
//! nbe2mqtt::bridge::run(&reader, &publisher, config.interval_duration()).await;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod discovery;
pub mod error;
pub mod publisher;
pub mod reader;

pub use bridge::{CycleOutcome, EMPTY_PAYLOAD_ERROR};
pub use config::{Config, Mode, config_path};
pub use discovery::{DeviceInfo, DiscoveryPayload, Topics};
pub use error::{ConfigError, Error, PublishError, ReadError, Result};
pub use publisher::{Availability, Publisher};
pub use reader::{CloudReader, LocalReader, Reader, Snapshot};
