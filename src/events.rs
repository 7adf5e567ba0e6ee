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

//! Event processing and alert dispatch.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bluetooth::SensorEvent;
use crate::moisture::MoistureInterpreter;
use crate::notifier::AlertDispatcher;
use crate::state::{AppState, ConnectionStatus};

/// Process events from the sensor link.
pub struct EventProcessor {
    state: Arc<AppState>,
    interpreter: Arc<MoistureInterpreter>,
    alerts: Arc<AlertDispatcher>,
    debounce: Duration,
    shutdown: CancellationToken,
}

impl EventProcessor {
    /// Create a new event processor.
    pub fn new(
        state: Arc<AppState>,
        interpreter: Arc<MoistureInterpreter>,
        alerts: Arc<AlertDispatcher>,
        debounce: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state,
            interpreter,
            alerts,
            debounce,
            shutdown,
        }
    }

    /// Consume events until the channel closes or shutdown is requested.
    pub async fn run(self, mut event_rx: mpsc::Receiver<SensorEvent>) {
        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = event_rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if let Err(e) = self.process_event(event) {
                error!("Error processing sensor event: {}", e);
            }
        }
        debug!("Event processor stopped");
    }

    /// Process a single event.
    pub fn process_event(&self, event: SensorEvent) -> Result<()> {
        match event {
            SensorEvent::Status(status) => {
                debug!("Bluetooth: {}", status.as_str());
                // Connecting is only reported once access has been granted.
                if status == ConnectionStatus::Connecting {
                    self.state.clear_notice();
                }
                self.state.set_status(status);
            }
            SensorEvent::Connected { peer, generation } => {
                info!("Sensor connected: {} (generation {})", peer, generation);
                self.state.set_connected(peer, generation);
            }
            SensorEvent::RawMessage { generation, text } => {
                self.handle_raw(generation, text);
            }
            SensorEvent::ReaderStopped { generation, reason } => {
                info!("Reader {} stopped: {}", generation, reason);
            }
            SensorEvent::PermissionDenied(reason) => {
                warn!("{}", reason);
                self.state.set_notice(reason);
            }
            SensorEvent::Error(e) => {
                error!("Connection error: {}", e);
            }
        }
        Ok(())
    }

    /// Show raw text now, act on it once the debounce window has passed.
    fn handle_raw(&self, generation: u64, text: String) {
        let current = self.state.generation();
        if generation != current {
            debug!(
                "Dropping message from stale reader {} (current {})",
                generation, current
            );
            return;
        }

        self.state.set_raw_text(text.clone());

        let state = self.state.clone();
        let interpreter = self.interpreter.clone();
        let alerts = self.alerts.clone();
        let shutdown = self.shutdown.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }

            let Some(reading) = interpreter.interpret(&text) else {
                return;
            };
            state.set_moisture_value(reading.value);

            if let Some(alert) = interpreter.classify(&reading) {
                if let Err(e) = alerts.dispatch(&alert) {
                    error!("Failed to send alert: {}", e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::StateNotifier;

    fn processor(state: Arc<AppState>) -> EventProcessor {
        let shutdown = CancellationToken::new();
        let alerts = Arc::new(AlertDispatcher::new(
            Arc::new(StateNotifier::new(state.clone())),
            Duration::from_secs(5),
            shutdown.clone(),
        ));
        EventProcessor::new(
            state,
            Arc::new(MoistureInterpreter::default()),
            alerts,
            Duration::from_secs(8),
            shutdown,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_text_shown_before_value() {
        let state = AppState::new();
        let processor = processor(state.clone());
        processor
            .process_event(SensorEvent::Connected {
                peer: "00:23:00:00:5F:1A".to_string(),
                generation: 1,
            })
            .unwrap();

        processor
            .process_event(SensorEvent::RawMessage {
                generation: 1,
                text: "640\n".to_string(),
            })
            .unwrap();

        assert_eq!(state.get_raw_text().as_deref(), Some("640\n"));
        assert_eq!(state.get_moisture_value(), None);

        tokio::time::sleep(Duration::from_millis(8100)).await;
        assert_eq!(state.get_moisture_value(), Some(640));
        assert_eq!(state.get_active_alert(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_is_ignored() {
        let state = AppState::new();
        let processor = processor(state.clone());
        processor
            .process_event(SensorEvent::Connected {
                peer: "00:23:00:00:5F:1A".to_string(),
                generation: 2,
            })
            .unwrap();

        processor
            .process_event(SensorEvent::RawMessage {
                generation: 1,
                text: "900".to_string(),
            })
            .unwrap();

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(state.get_raw_text(), None);
        assert_eq!(state.get_active_alert(), None);
    }

    #[tokio::test]
    async fn test_status_and_notice_reach_state() {
        let state = AppState::new();
        let processor = processor(state.clone());

        processor
            .process_event(SensorEvent::Status(ConnectionStatus::Connecting))
            .unwrap();
        processor
            .process_event(SensorEvent::PermissionDenied(
                "Bluetooth not enabled".to_string(),
            ))
            .unwrap();

        assert_eq!(state.get_status(), ConnectionStatus::Connecting);
        assert_eq!(state.get_notice().as_deref(), Some("Bluetooth not enabled"));
    }

    #[tokio::test]
    async fn test_notice_cleared_once_access_granted() {
        let state = AppState::new();
        let processor = processor(state.clone());

        processor
            .process_event(SensorEvent::PermissionDenied(
                "Bluetooth not enabled".to_string(),
            ))
            .unwrap();
        processor
            .process_event(SensorEvent::Status(ConnectionStatus::Disconnected))
            .unwrap();
        assert!(state.get_notice().is_some());

        // Granted on a later tick, but the connect cycle still fails.
        processor
            .process_event(SensorEvent::Status(ConnectionStatus::Connecting))
            .unwrap();
        processor
            .process_event(SensorEvent::Error("Connection failed".to_string()))
            .unwrap();
        processor
            .process_event(SensorEvent::Status(ConnectionStatus::Disconnected))
            .unwrap();

        assert_eq!(state.get_notice(), None);
        assert_eq!(state.get_status(), ConnectionStatus::Disconnected);
    }
}
