// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cloud read strategy.
//!
//! A single `GET https://stokercloud.dk/devices/<serial>/json` with HTTP
//! basic authentication fetches both data categories at once. The vendor
//! API has two observed response shapes: `operating`/`settings` at the
//! top level, or nested under a `payload` object; the nested shape is
//! used when the top-level mappings are absent or empty.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};

use crate::error::ReadError;
use crate::reader::Snapshot;

const DEFAULT_BASE_URL: &str = "https://stokercloud.dk";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Reads snapshots from the vendor cloud endpoint.
#[derive(Debug)]
pub struct CloudReader {
    serial: String,
    username: Option<String>,
    password: Option<String>,
    base_url: String,
    client: Client,
}

impl CloudReader {
    /// Creates a reader for the given appliance serial.
    ///
    /// Credentials may be absent; reads then fail fast with
    /// [`ReadError::MissingSetting`] instead of failing construction.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        serial: String,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ReadError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            serial,
            username,
            password,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Sets a custom endpoint base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns the endpoint host, recorded as the effective source
    /// address in each cycle's attributes document.
    #[must_use]
    pub fn host(&self) -> &str {
        let rest = self
            .base_url
            .strip_prefix("https://")
            .or_else(|| self.base_url.strip_prefix("http://"))
            .unwrap_or(&self.base_url);
        rest.split([':', '/']).next().unwrap_or(rest)
    }

    /// Fetches one snapshot from the cloud endpoint.
    ///
    /// # Errors
    ///
    /// Returns error on missing credentials, a non-success HTTP status,
    /// or any transport or body-parse failure.
    pub async fn read(&self) -> Result<Snapshot, ReadError> {
        let username = self
            .username
            .as_deref()
            .ok_or(ReadError::MissingSetting("cloud_username"))?;
        let password = self
            .password
            .as_deref()
            .ok_or(ReadError::MissingSetting("cloud_password"))?;

        let url = format!(
            "{}/devices/{}/json",
            self.base_url,
            urlencoding::encode(&self.serial)
        );
        tracing::debug!(url = %url, "sending cloud request");

        let response = self
            .client
            .get(&url)
            .basic_auth(username, Some(password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReadError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        Ok(snapshot_from_body(&body))
    }
}

/// Extracts the two data mappings from a response body, falling back to
/// the nested `payload` shape when the top level carries nothing.
fn snapshot_from_body(body: &Value) -> Snapshot {
    let operating = object_field(body, "operating");
    let settings = object_field(body, "settings");
    if operating.is_empty() && settings.is_empty()
        && let Some(nested) = body.get("payload")
    {
        return Snapshot {
            operating: object_field(nested, "operating"),
            settings: object_field(nested, "settings"),
        };
    }
    Snapshot {
        operating,
        settings,
    }
}

fn object_field(value: &Value, key: &str) -> Map<String, Value> {
    value
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reader() -> CloudReader {
        CloudReader::new("1234".to_string(), None, None).unwrap()
    }

    #[test]
    fn top_level_shape_is_used_directly() {
        let body = json!({
            "operating": {"boiler_temp": 74.5},
            "settings": {"wanted_temp": 72}
        });
        let snapshot = snapshot_from_body(&body);
        assert_eq!(snapshot.operating["boiler_temp"], json!(74.5));
        assert_eq!(snapshot.settings["wanted_temp"], json!(72));
    }

    #[test]
    fn empty_top_level_falls_back_to_nested_payload() {
        let body = json!({
            "operating": {},
            "payload": {
                "operating": {"boiler_temp": 74.5},
                "settings": {"wanted_temp": 72}
            }
        });
        let snapshot = snapshot_from_body(&body);
        assert_eq!(snapshot.operating["boiler_temp"], json!(74.5));
        assert_eq!(snapshot.settings["wanted_temp"], json!(72));
    }

    #[test]
    fn absent_keys_fall_back_to_nested_payload() {
        let body = json!({
            "payload": {"operating": {"a": 1}, "settings": {}}
        });
        let snapshot = snapshot_from_body(&body);
        assert_eq!(snapshot.operating["a"], json!(1));
        assert!(snapshot.settings.is_empty());
    }

    #[test]
    fn non_empty_top_level_wins_over_nested() {
        let body = json!({
            "operating": {"a": 1},
            "payload": {"operating": {"b": 2}}
        });
        let snapshot = snapshot_from_body(&body);
        assert!(snapshot.operating.contains_key("a"));
        assert!(!snapshot.operating.contains_key("b"));
    }

    #[test]
    fn unrecognized_body_yields_empty_snapshot() {
        assert!(snapshot_from_body(&json!("nope")).is_empty());
        assert!(snapshot_from_body(&json!({"operating": 3})).is_empty());
    }

    #[test]
    fn default_host() {
        assert_eq!(reader().host(), "stokercloud.dk");
    }

    #[test]
    fn host_from_custom_base_url() {
        let reader = reader().with_base_url("http://127.0.0.1:8080");
        assert_eq!(reader.host(), "127.0.0.1");
    }

    #[tokio::test]
    async fn read_without_credentials_fails_fast() {
        let result = reader().read().await;
        assert!(matches!(
            result,
            Err(ReadError::MissingSetting("cloud_username"))
        ));
    }
}
