// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The poll loop.
//!
//! Read, evaluate, publish, sleep, forever. Every read error is caught
//! at this boundary and converted into a failed-cycle publish; nothing
//! here terminates the process, and a failed cycle is retried after the
//! same fixed interval as a successful one — no backoff, no jitter.

use std::time::Duration;

use crate::error::ReadError;
use crate::publisher::Publisher;
use crate::reader::{Reader, Snapshot};

/// Error text for a cycle whose snapshot came back entirely empty.
///
/// An empty-but-well-formed device response is reported the same way as
/// a degraded link. Deliberate: downstream consumers treat the two
/// identically, even though this can mask partial data loss.
pub const EMPTY_PAYLOAD_ERROR: &str = "empty payload";

/// The result of one poll cycle, as handed to the publisher.
#[derive(Debug)]
pub struct CycleOutcome {
    /// Whether the cycle produced usable data.
    pub ok: bool,
    /// The snapshot; `None` when the read raised an error.
    pub snapshot: Option<Snapshot>,
    /// Human-readable failure description; `None` on success.
    pub error: Option<String>,
}

impl CycleOutcome {
    /// Evaluates a read result into a cycle outcome.
    ///
    /// A successful read with both mappings empty is a soft failure:
    /// `ok` is false and the error text is [`EMPTY_PAYLOAD_ERROR`], but
    /// the (empty) snapshot is still attached. A read error yields no
    /// snapshot and carries the error's message text.
    #[must_use]
    pub fn from_read(result: Result<Snapshot, ReadError>) -> Self {
        match result {
            Ok(snapshot) if snapshot.is_empty() => Self {
                ok: false,
                snapshot: Some(snapshot),
                error: Some(EMPTY_PAYLOAD_ERROR.to_string()),
            },
            Ok(snapshot) => Self {
                ok: true,
                snapshot: Some(snapshot),
                error: None,
            },
            Err(e) => Self {
                ok: false,
                snapshot: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Runs the poll loop. Never returns; the process ends only on an
/// external termination signal.
pub async fn run(reader: &Reader, publisher: &Publisher, interval: Duration) {
    loop {
        let outcome = CycleOutcome::from_read(reader.read().await);
        if outcome.ok {
            tracing::debug!("cycle completed");
        } else {
            tracing::warn!(
                error = outcome.error.as_deref().unwrap_or_default(),
                "cycle failed"
            );
        }
        publisher.publish_cycle(&outcome).await;
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    fn non_empty_snapshot() -> Snapshot {
        let mut operating = Map::new();
        operating.insert("boiler_temp".to_string(), Value::from(74.5));
        Snapshot {
            operating,
            settings: Map::new(),
        }
    }

    #[test]
    fn successful_read_is_ok() {
        let outcome = CycleOutcome::from_read(Ok(non_empty_snapshot()));
        assert!(outcome.ok);
        assert!(outcome.error.is_none());
        assert!(outcome.snapshot.is_some());
    }

    #[test]
    fn empty_snapshot_is_a_soft_failure() {
        let outcome = CycleOutcome::from_read(Ok(Snapshot::default()));
        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_deref(), Some(EMPTY_PAYLOAD_ERROR));
        // the empty snapshot is still attached
        assert!(outcome.snapshot.is_some());
    }

    #[test]
    fn one_non_empty_mapping_is_enough() {
        let outcome = CycleOutcome::from_read(Ok(non_empty_snapshot()));
        assert!(outcome.ok);
    }

    #[test]
    fn read_error_carries_its_message() {
        let outcome = CycleOutcome::from_read(Err(ReadError::MissingSetting("nbe_host")));
        assert!(!outcome.ok);
        assert!(outcome.snapshot.is_none());
        assert_eq!(
            outcome.error.as_deref(),
            Some("missing required setting: nbe_host")
        );
    }

    #[test]
    fn timeout_error_carries_its_message() {
        let outcome = CycleOutcome::from_read(Err(ReadError::Timeout(5)));
        assert_eq!(
            outcome.error.as_deref(),
            Some("device did not answer within 5 s")
        );
    }
}
