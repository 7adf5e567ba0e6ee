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

//! Soil Moisture Monitor Desktop Application

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soil_moisture_monitor::bluetooth::{AdapterGate, Connector, RfcommTransport, SensorEvent};
use soil_moisture_monitor::config::Config;
use soil_moisture_monitor::events::EventProcessor;
use soil_moisture_monitor::moisture::{AlertKind, MoistureInterpreter};
use soil_moisture_monitor::monitor::HealthMonitor;
use soil_moisture_monitor::notifier::{AlertDispatcher, StateNotifier};
use soil_moisture_monitor::state::AppState;
use soil_moisture_monitor::ui::{self, TrayAction};

/// How often the tray re-reads the shared state.
const TRAY_REFRESH: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("soil_moisture_monitor=info".parse()?),
        )
        .init();

    info!(
        "Starting Soil Moisture Monitor v{}...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::load()?;
    let peer = config.peer_address()?;
    info!("Configuration loaded, sensor at {}", peer);

    // Create application state
    let state = AppState::new();
    let shutdown = CancellationToken::new();

    // Initialize Bluetooth
    let transport = Arc::new(
        RfcommTransport::new(config.device.channel)
            .await
            .context("Bluetooth not supported")?,
    );
    let gate = Arc::new(AdapterGate::new(
        transport.adapter().clone(),
        config.device.power_on_adapter,
    ));
    let connector = Connector::new(transport, peer, config.retry_policy());

    // Alerts
    let notifier = Arc::new(StateNotifier::new(state.clone()));
    let alerts = Arc::new(AlertDispatcher::new(
        notifier,
        config.auto_dismiss(),
        shutdown.clone(),
    ));

    // Event processing
    let (event_tx, event_rx) = mpsc::channel::<SensorEvent>(32);
    let processor = EventProcessor::new(
        state.clone(),
        Arc::new(MoistureInterpreter::new(config.thresholds)),
        alerts.clone(),
        config.debounce(),
        shutdown.clone(),
    );
    let processor_task = tokio::spawn(processor.run(event_rx));

    // Health monitor owns the link from here on
    let monitor = HealthMonitor::new(
        connector,
        gate,
        event_tx,
        config.check_interval(),
        shutdown.clone(),
    );
    let monitor_task = tokio::spawn(monitor.run());

    // Start system tray
    let (mut action_rx, tray_handle) = ui::run_tray(state.clone())?;
    let mut refresh = tokio::time::interval(TRAY_REFRESH);

    info!("Ready. System tray active.");

    // Handle tray actions
    loop {
        tokio::select! {
            Some(action) = action_rx.recv() => {
                let result = match action {
                    TrayAction::TriggerHighAlert => alerts.trigger(AlertKind::High),
                    TrayAction::TriggerLowAlert => alerts.trigger(AlertKind::Low),
                    TrayAction::Quit => {
                        info!("Quit requested");
                        break;
                    }
                };
                if let Err(e) = result {
                    error!("Failed to send alert: {}", e);
                }
                tray_handle.update(|_| {});
            }
            _ = refresh.tick() => {
                tray_handle.update(|_| {});
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    shutdown.cancel();
    let _ = monitor_task.await;
    let _ = processor_task.await;

    info!("Soil Moisture Monitor stopped");
    Ok(())
}
