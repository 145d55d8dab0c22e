// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus publisher.
//!
//! Owns the MQTT connection. Startup happens once, in order: connect
//! with a retained last-will on the availability topic, publish the
//! retained discovery descriptor, publish retained availability-true.
//! Afterwards the poll loop only issues the per-cycle state and
//! attributes publishes, which are fire-and-forget: failures are logged
//! and never fed back into the cycle outcome.
//!
//! Socket I/O and keep-alives run on a dedicated background task that
//! shares nothing with the poll loop but the clonable client handle.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::oneshot;

use crate::bridge::CycleOutcome;
use crate::config::{Config, Mode};
use crate::discovery::{DiscoveryPayload, Topics};
use crate::error::PublishError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Availability payload, retained on the availability topic and used as
/// the last-will message.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Availability {
    /// Whether the bridge is up.
    pub available: bool,
}

/// Per-cycle attributes document.
#[derive(Debug, Serialize)]
struct CycleAttributes<'a> {
    ok: bool,
    error: Option<&'a str>,
    timestamp: String,
    mode: Mode,
    host: Option<&'a str>,
    serial: &'a str,
    operating: Option<&'a Map<String, Value>>,
    settings: Option<&'a Map<String, Value>>,
}

/// MQTT publisher for one bridged appliance.
pub struct Publisher {
    client: AsyncClient,
    topics: Topics,
    mode: Mode,
    source: Option<String>,
    serial: String,
}

impl Publisher {
    /// Connects to the broker and spawns the background event-loop task.
    ///
    /// The connection carries a retained `{"available": false}` last
    /// will on the availability topic, so the bus learns `offline`
    /// automatically if the process dies uncleanly.
    ///
    /// # Errors
    ///
    /// Returns error if the broker does not acknowledge the connection
    /// within the connect timeout.
    pub async fn connect(
        config: &Config,
        topics: Topics,
        source: Option<String>,
    ) -> Result<Self, PublishError> {
        let client_id = format!("{}_{}", topics.device_id(), std::process::id());
        let mut options = MqttOptions::new(client_id, &config.mqtt_host, config.mqtt_port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);
        if let Some((username, password)) = config.mqtt_credentials() {
            options.set_credentials(username, password);
        }
        let will_payload = serde_json::to_string(&Availability { available: false })?;
        options.set_last_will(LastWill::new(
            &topics.availability,
            will_payload,
            QoS::AtLeastOnce,
            true,
        ));

        let (client, event_loop) = AsyncClient::new(options, 10);

        let (connack_tx, connack_rx) = oneshot::channel();
        tokio::spawn(async move {
            run_event_loop(event_loop, connack_tx).await;
        });

        match tokio::time::timeout(CONNECT_TIMEOUT, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %config.mqtt_host,
                    port = config.mqtt_port,
                    "connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                return Err(PublishError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                return Err(PublishError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    CONNECT_TIMEOUT.as_secs()
                )));
            }
        }

        Ok(Self {
            client,
            topics,
            mode: config.mode,
            source,
            serial: config.nbe_serial.clone(),
        })
    }

    /// Publishes the retained startup messages: the discovery descriptor
    /// and availability-true.
    ///
    /// Must be called exactly once, before the first poll cycle.
    ///
    /// # Errors
    ///
    /// Returns error if a payload cannot be serialized or a publish
    /// cannot be queued.
    pub async fn announce(&self, discovery: &DiscoveryPayload) -> Result<(), PublishError> {
        let descriptor = serde_json::to_string(discovery)?;
        self.client
            .publish(&self.topics.config, QoS::AtLeastOnce, true, descriptor)
            .await?;

        let available = serde_json::to_string(&Availability { available: true })?;
        self.client
            .publish(&self.topics.availability, QoS::AtLeastOnce, true, available)
            .await?;

        tracing::info!(topic = %self.topics.config, "published discovery descriptor");
        Ok(())
    }

    /// Publishes one cycle's state and attributes, fire-and-forget.
    ///
    /// The state topic carries `online` iff the cycle succeeded; the
    /// attributes topic carries the full JSON document. Neither publish
    /// is retained and neither failure reaches the poll loop.
    pub async fn publish_cycle(&self, outcome: &CycleOutcome) {
        let state = if outcome.ok { "online" } else { "offline" };
        if let Err(e) = self
            .client
            .publish(&self.topics.state, QoS::AtMostOnce, false, state)
            .await
        {
            tracing::warn!(topic = %self.topics.state, error = %e, "state publish failed");
        }

        let attributes = CycleAttributes {
            ok: outcome.ok,
            error: outcome.error.as_deref(),
            timestamp: utc_timestamp(),
            mode: self.mode,
            host: self.source.as_deref(),
            serial: &self.serial,
            operating: outcome.snapshot.as_ref().map(|s| &s.operating),
            settings: outcome.snapshot.as_ref().map(|s| &s.settings),
        };
        match serde_json::to_string(&attributes) {
            Ok(document) => {
                tracing::debug!(topic = %self.topics.attributes, payload = %document, "publishing attributes");
                if let Err(e) = self
                    .client
                    .publish(&self.topics.attributes, QoS::AtMostOnce, false, document)
                    .await
                {
                    tracing::warn!(topic = %self.topics.attributes, error = %e, "attributes publish failed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "attributes serialization failed");
            }
        }
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("state_topic", &self.topics.state)
            .field("mode", &self.mode)
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}

fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Drives the MQTT connection. Keeps polling on error so the client
/// reconnects; the task only ends with the process.
async fn run_event_loop(mut event_loop: EventLoop, connack_tx: oneshot::Sender<()>) {
    let mut connack_tx = Some(connack_tx);
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT connected");
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT event loop error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
