// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Test utility for the sensor link.
//!
//! Connects once with the configured retry policy and prints every chunk the
//! sensor sends, along with how it would be classified.
//!
//! Usage: cargo run --bin probe_sensor -- [address]

use anyhow::{anyhow, Result};
use std::env;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use soil_moisture_monitor::bluetooth::{Connector, RfcommTransport, SensorEvent, StreamReader};
use soil_moisture_monitor::config::Config;
use soil_moisture_monitor::moisture::MoistureInterpreter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut config = Config::load()?;
    if let Some(address) = env::args().nth(1) {
        config.device.address = address;
    }
    let peer = config.peer_address()?;

    println!("Opening BlueZ session...");
    let transport = Arc::new(RfcommTransport::new(config.device.channel).await?);
    let connector = Connector::new(transport, peer, config.retry_policy());

    println!(
        "Connecting to {} (up to {} attempts)...",
        peer,
        connector.policy().max_attempts
    );
    let cancel = CancellationToken::new();
    let connection = connector
        .connect(1, &cancel)
        .await
        .map_err(|e| anyhow!("Could not reach sensor: {}", e))?;
    println!("Connected. Press Ctrl+C to stop.");

    let (event_tx, mut event_rx) = mpsc::channel(32);
    let reader = StreamReader::new(connection, event_tx, cancel.clone()).spawn();
    let interpreter = MoistureInterpreter::new(config.thresholds);

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(SensorEvent::RawMessage { text, .. }) => {
                    let verdict = match interpreter.interpret(&text) {
                        Some(reading) => match interpreter.classify(&reading) {
                            Some(alert) => format!("{} -> {:?}", reading.value, alert.kind),
                            None => format!("{} -> ok", reading.value),
                        },
                        None => "unparsable".to_string(),
                    };
                    println!("{:?}\t{}", text, verdict);
                }
                Some(SensorEvent::ReaderStopped { reason, .. }) => {
                    println!("Stream ended: {}", reason);
                    break;
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Stopping...");
                break;
            }
        }
    }

    cancel.cancel();
    let _ = reader.await;
    Ok(())
}
