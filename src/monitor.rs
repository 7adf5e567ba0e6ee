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

//! Periodic health check that keeps the sensor link alive.
//!
//! Every tick either confirms the current reader is still running or runs
//! one connect cycle. A failed cycle is simply retried on the next tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bluetooth::{Access, CapabilityGate, Connector, SensorEvent, StreamReader};
use crate::error::ConnectError;
use crate::state::ConnectionStatus;

/// The reader task of the current connection.
struct ActiveLink {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveLink {
    fn is_alive(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancel the reader and wait until it has let go of the stream.
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                error!("Reader for generation {} panicked", self.generation);
            }
        }
    }
}

/// Drives reconnects for the single sensor link.
pub struct HealthMonitor {
    connector: Connector,
    gate: Arc<dyn CapabilityGate>,
    event_tx: mpsc::Sender<SensorEvent>,
    interval: Duration,
    shutdown: CancellationToken,
    link: Option<ActiveLink>,
    generation: u64,
}

impl HealthMonitor {
    pub fn new(
        connector: Connector,
        gate: Arc<dyn CapabilityGate>,
        event_tx: mpsc::Sender<SensorEvent>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connector,
            gate,
            event_tx,
            interval,
            shutdown,
            link: None,
            generation: 0,
        }
    }

    /// Whether a reader for the current connection is still running.
    pub fn is_connected(&self) -> bool {
        self.link.as_ref().is_some_and(ActiveLink::is_alive)
    }

    /// Generation of the most recent successful connection.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Emit an event.
    async fn emit(&self, event: SensorEvent) {
        let _ = self.event_tx.send(event).await;
    }

    /// One health check.
    pub async fn tick(&mut self) -> ConnectionStatus {
        if self.is_connected() {
            debug!("Sensor link healthy");
            self.emit(SensorEvent::Status(ConnectionStatus::Connected))
                .await;
            return ConnectionStatus::Connected;
        }

        self.emit(SensorEvent::Status(ConnectionStatus::Disconnected))
            .await;
        self.reconnect().await
    }

    /// Drop the current link, if any.
    pub async fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            info!("Closing link (generation {})", link.generation);
            link.stop().await;
        }
    }

    async fn reconnect(&mut self) -> ConnectionStatus {
        self.disconnect().await;

        if let Access::Denied(reason) = self.gate.check().await {
            warn!("Not connecting: {}", reason);
            self.emit(SensorEvent::PermissionDenied(reason)).await;
            return ConnectionStatus::Disconnected;
        }

        self.emit(SensorEvent::Status(ConnectionStatus::Connecting))
            .await;

        let generation = self.generation + 1;
        match self.connector.connect(generation, &self.shutdown).await {
            Ok(connection) => {
                self.generation = generation;
                // Announce before the reader can produce messages for this generation.
                self.emit(SensorEvent::Connected {
                    peer: connection.peer().to_string(),
                    generation,
                })
                .await;

                let cancel = self.shutdown.child_token();
                let handle =
                    StreamReader::new(connection, self.event_tx.clone(), cancel.clone()).spawn();
                self.link = Some(ActiveLink {
                    generation,
                    cancel,
                    handle,
                });
                ConnectionStatus::Connected
            }
            Err(ConnectError::Cancelled) => ConnectionStatus::Disconnected,
            Err(ConnectError::PermissionDenied(reason)) => {
                warn!("Sensor refused access: {}", reason);
                self.emit(SensorEvent::PermissionDenied(reason)).await;
                self.emit(SensorEvent::Status(ConnectionStatus::Disconnected))
                    .await;
                ConnectionStatus::Disconnected
            }
            Err(e) => {
                warn!("Sensor unreachable: {}", e);
                self.emit(SensorEvent::Error(e.to_string())).await;
                self.emit(SensorEvent::Status(ConnectionStatus::Disconnected))
                    .await;
                ConnectionStatus::Disconnected
            }
        }
    }

    /// Check the link now and then every `interval` until shutdown.
    pub async fn run(mut self) {
        info!(
            "Health monitor started for {} (every {:?})",
            self.connector.peer(),
            self.interval
        );

        loop {
            self.tick().await;

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.disconnect().await;
        info!("Health monitor stopped");
    }
}
