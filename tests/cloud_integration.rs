// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the cloud read strategy using wiremock.

use nbe2mqtt::{CloudReader, ReadError};
use serde_json::json;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reader_for(server: &MockServer) -> CloudReader {
    CloudReader::new(
        "1234".to_string(),
        Some("user".to_string()),
        Some("secret".to_string()),
    )
    .unwrap()
    .with_base_url(server.uri())
}

#[tokio::test]
async fn reads_top_level_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices/1234/json"))
        .and(basic_auth("user", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "operating": {"boiler_temp": "74.5", "power_pct": "32"},
            "settings": {"wanted_temp": "72"}
        })))
        .mount(&mock_server)
        .await;

    let snapshot = reader_for(&mock_server).read().await.unwrap();

    assert_eq!(snapshot.operating["boiler_temp"], json!("74.5"));
    assert_eq!(snapshot.operating["power_pct"], json!("32"));
    assert_eq!(snapshot.settings["wanted_temp"], json!("72"));
}

#[tokio::test]
async fn falls_back_to_nested_payload_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices/1234/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "operating": {},
            "payload": {
                "operating": {"boiler_temp": "74.5"},
                "settings": {"wanted_temp": "72"}
            }
        })))
        .mount(&mock_server)
        .await;

    let snapshot = reader_for(&mock_server).read().await.unwrap();

    assert_eq!(snapshot.operating["boiler_temp"], json!("74.5"));
    assert_eq!(snapshot.settings["wanted_temp"], json!("72"));
}

#[tokio::test]
async fn non_success_status_fails_the_cycle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let result = reader_for(&mock_server).read().await;

    assert!(matches!(result, Err(ReadError::Status(503))));
}

#[tokio::test]
async fn unauthorized_status_fails_the_cycle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let result = reader_for(&mock_server).read().await;

    assert!(matches!(result, Err(ReadError::Status(401))));
}

#[tokio::test]
async fn malformed_body_fails_the_cycle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = reader_for(&mock_server).read().await;

    assert!(matches!(result, Err(ReadError::Http(_))));
}

#[tokio::test]
async fn empty_body_object_yields_empty_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let snapshot = reader_for(&mock_server).read().await.unwrap();

    assert!(snapshot.is_empty());
}
