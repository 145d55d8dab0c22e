// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local read strategy.
//!
//! The appliance answers padded-ASCII request/response datagrams on UDP
//! port 8483. One request is sent per data category (`operating`, then
//! `settings`); a response carries a status digit and a
//! `name=value;name=value` payload.
//!
//! Request frame: `STX`, app id (12), serial (6), PIN (10), function
//! (2), sequence (2), payload size (3), payload, `ETX`.
//!
//! Response frame: `STX`, app id (12), serial (6), function (2),
//! sequence (2), status (1), payload size (3), payload, `ETX`.
//!
//! A malformed response payload yields an empty mapping; only socket
//! errors and timeouts fail the cycle.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::net::UdpSocket;

use crate::error::ReadError;
use crate::reader::Snapshot;

const DEVICE_PORT: u16 = 8483;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

const APP_ID: &str = "nbe2mqtt";
const STX: char = '\u{02}';
const ETX: char = '\u{03}';

// Response header field offsets, after the framing bytes are stripped.
const STATUS_OFFSET: usize = 22;
const SIZE_OFFSET: usize = 23;
const RESPONSE_HEADER_LEN: usize = 26;

/// Data category read from the appliance.
#[derive(Debug, Clone, Copy)]
enum Category {
    Operating,
    Settings,
}

impl Category {
    const fn function(self) -> u8 {
        match self {
            Self::Settings => 1,
            Self::Operating => 4,
        }
    }
}

/// Reads snapshots from the appliance over its local protocol.
#[derive(Debug)]
pub struct LocalReader {
    host: Option<String>,
    serial: String,
    pin: Option<String>,
    port: u16,
    timeout: Duration,
}

impl LocalReader {
    /// Creates a reader for the given appliance.
    ///
    /// Host and PIN may be absent; reads then fail fast with
    /// [`ReadError::MissingSetting`] instead of failing construction.
    #[must_use]
    pub fn new(host: Option<String>, serial: String, pin: Option<String>) -> Self {
        Self {
            host,
            serial,
            pin,
            port: DEVICE_PORT,
            timeout: READ_TIMEOUT,
        }
    }

    /// Sets a custom device port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets a custom per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured appliance address.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Fetches the `operating` and `settings` categories.
    ///
    /// # Errors
    ///
    /// Returns error if host or PIN is missing, or on any socket error
    /// or timeout in either request. No partial snapshot is returned.
    pub async fn read(&self) -> Result<Snapshot, ReadError> {
        let host = self
            .host
            .as_deref()
            .ok_or(ReadError::MissingSetting("nbe_host"))?;
        let pin = self
            .pin
            .as_deref()
            .ok_or(ReadError::MissingSetting("nbe_password"))?;

        let operating = self.request(host, pin, Category::Operating, 0).await?;
        let settings = self.request(host, pin, Category::Settings, 1).await?;

        Ok(Snapshot {
            operating,
            settings,
        })
    }

    async fn request(
        &self,
        host: &str,
        pin: &str,
        category: Category,
        sequence: u8,
    ) -> Result<Map<String, Value>, ReadError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect((host, self.port)).await?;

        let frame = encode_request(&self.serial, pin, category, sequence);
        tracing::debug!(host = %host, function = category.function(), "sending device request");
        socket.send(&frame).await?;

        let mut buf = vec![0u8; 4096];
        let received = tokio::time::timeout(self.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| ReadError::Timeout(self.timeout.as_secs()))??;

        Ok(decode_payload(&buf[..received]))
    }
}

/// Encodes a read request frame.
fn encode_request(serial: &str, pin: &str, category: Category, sequence: u8) -> Vec<u8> {
    let payload = "*";
    let mut frame = String::with_capacity(40);
    frame.push(STX);
    frame.push_str(&format!("{APP_ID:<12}"));
    frame.push_str(&format!("{serial:>6}"));
    frame.push_str(&format!("{pin:<10}"));
    frame.push_str(&format!("{:02}", category.function()));
    frame.push_str(&format!("{sequence:02}"));
    frame.push_str(&format!("{:03}", payload.len()));
    frame.push_str(payload);
    frame.push(ETX);
    frame.into_bytes()
}

/// Decodes a response frame into a payload mapping.
///
/// Any malformed frame — bad encoding, short header, non-zero status,
/// unparseable size field — yields an empty mapping.
fn decode_payload(frame: &[u8]) -> Map<String, Value> {
    let Ok(text) = std::str::from_utf8(frame) else {
        return Map::new();
    };
    if !text.is_ascii() {
        return Map::new();
    }
    let text = text.trim_start_matches(STX).trim_end_matches(ETX);
    if text.len() < RESPONSE_HEADER_LEN {
        return Map::new();
    }
    if &text[STATUS_OFFSET..=STATUS_OFFSET] != "0" {
        return Map::new();
    }
    let Ok(size) = text[SIZE_OFFSET..RESPONSE_HEADER_LEN].parse::<usize>() else {
        return Map::new();
    };
    let payload = &text[RESPONSE_HEADER_LEN..];
    let payload = payload.get(..size).unwrap_or(payload);
    parse_pairs(payload)
}

/// Parses a `name=value;name=value` payload into a mapping.
fn parse_pairs(payload: &str) -> Map<String, Value> {
    payload
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect()
}
