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

//! System tray implementation using ksni.

use anyhow::Result;
use ksni::{self, menu::StandardItem, Handle, MenuItem, Tray, TrayService};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::state::{AppState, ConnectionStatus, UiSnapshot};

/// Actions that can be triggered from the tray menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayAction {
    TriggerHighAlert,
    TriggerLowAlert,
    Quit,
}

/// System tray icon and menu.
pub struct SoilMonitorTray {
    state: Arc<AppState>,
    action_tx: mpsc::UnboundedSender<TrayAction>,
}

impl SoilMonitorTray {
    pub fn new(state: Arc<AppState>, action_tx: mpsc::UnboundedSender<TrayAction>) -> Self {
        Self { state, action_tx }
    }
}

/// First menu line.
fn status_line(snapshot: &UiSnapshot) -> String {
    match snapshot.connection_status {
        ConnectionStatus::Connected => format!(
            "● Bluetooth: Connected ({})",
            snapshot.peer.as_deref().unwrap_or("sensor")
        ),
        ConnectionStatus::Connecting => "◐ Bluetooth: Connecting...".to_string(),
        ConnectionStatus::Disconnected => "○ Bluetooth: Not Connected".to_string(),
    }
}

fn moisture_line(snapshot: &UiSnapshot) -> String {
    match snapshot.moisture_value {
        Some(value) => format!("Soil Moisture: {}", value),
        None => "Soil Moisture: --".to_string(),
    }
}

fn raw_line(snapshot: &UiSnapshot) -> String {
    format!(
        "Raw Data: {}",
        snapshot.raw_text.as_deref().map(str::trim).unwrap_or("")
    )
}

impl Tray for SoilMonitorTray {
    fn icon_name(&self) -> String {
        if self.state.get_active_alert().is_some() {
            return "dialog-warning".to_string();
        }
        self.state.get_status().icon_name().to_string()
    }

    fn title(&self) -> String {
        "Soil Moisture Monitor".to_string()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        let snapshot = self.state.snapshot();

        let mut lines = vec![status_line(&snapshot), moisture_line(&snapshot)];
        if let Some(alert) = &snapshot.active_alert {
            lines.push(alert.clone());
        }
        if let Some(notice) = &snapshot.notice {
            lines.push(notice.clone());
        }

        ksni::ToolTip {
            icon_name: String::new(),
            icon_pixmap: Vec::new(),
            title: "Soil Moisture Monitor".to_string(),
            description: lines.join("\n"),
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        let snapshot = self.state.snapshot();

        let mut items = vec![];

        // Status header
        for label in [
            status_line(&snapshot),
            moisture_line(&snapshot),
            raw_line(&snapshot),
        ] {
            items.push(MenuItem::Standard(StandardItem {
                label,
                enabled: false,
                ..Default::default()
            }));
        }

        if let Some(alert) = snapshot.active_alert.or(snapshot.notice) {
            items.push(MenuItem::Standard(StandardItem {
                label: format!("⚠ {}", alert),
                enabled: false,
                ..Default::default()
            }));
        }

        items.push(MenuItem::Separator);

        // Manual alerts
        items.push(MenuItem::Standard(StandardItem {
            label: "Send High Moisture Alert".to_string(),
            activate: Box::new(|tray: &mut Self| {
                let _ = tray.action_tx.send(TrayAction::TriggerHighAlert);
            }),
            ..Default::default()
        }));

        items.push(MenuItem::Standard(StandardItem {
            label: "Send Low Moisture Alert".to_string(),
            activate: Box::new(|tray: &mut Self| {
                let _ = tray.action_tx.send(TrayAction::TriggerLowAlert);
            }),
            ..Default::default()
        }));

        items.push(MenuItem::Separator);

        // Quit
        items.push(MenuItem::Standard(StandardItem {
            label: "Quit".to_string(),
            activate: Box::new(|tray: &mut Self| {
                let _ = tray.action_tx.send(TrayAction::Quit);
            }),
            ..Default::default()
        }));

        items
    }

    fn id(&self) -> String {
        "soil-moisture-monitor".to_string()
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::Hardware
    }
}

/// Run the system tray service.
pub fn run_tray(
    state: Arc<AppState>,
) -> Result<(mpsc::UnboundedReceiver<TrayAction>, Handle<SoilMonitorTray>)> {
    let (action_tx, action_rx) = mpsc::unbounded_channel();

    let tray = SoilMonitorTray::new(state, action_tx);
    let service = TrayService::new(tray);
    let handle = service.handle();

    // Spawn the tray service
    std::thread::spawn(move || {
        let _ = service.run();
    });

    info!("System tray started");

    Ok((action_rx, handle))
}
