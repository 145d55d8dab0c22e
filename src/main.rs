// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge entry point.
//!
//! Startup order: load configuration (fatal on failure), select the
//! read strategy, connect and announce on the bus, then hand over to
//! the poll loop until the process is interrupted.

use nbe2mqtt::{Config, DiscoveryPayload, Error, Publisher, Reader, Topics, bridge, config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = config::config_path();
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "startup failed");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Error> {
    let reader = Reader::from_config(&config)?;
    let topics = Topics::new(&config.mqtt_prefix, &config.nbe_serial);
    let discovery = DiscoveryPayload::new(&config.nbe_serial, reader.model(), &topics);

    let source = reader.source().map(String::from);
    let publisher = Publisher::connect(&config, topics, source).await?;
    publisher.announce(&discovery).await?;

    tracing::info!(
        mode = %config.mode,
        serial = %config.nbe_serial,
        interval_secs = config.interval,
        "bridge started"
    );

    tokio::select! {
        () = bridge::run(&reader, &publisher, config.interval_duration()) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, exiting");
        }
    }
    Ok(())
}
