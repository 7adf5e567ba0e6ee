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

//! Application state management.

use parking_lot::RwLock;
use std::sync::Arc;

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Not Connected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "network-offline",
            ConnectionStatus::Connecting => "network-idle",
            ConnectionStatus::Connected => "network-transmit-receive",
        }
    }
}

/// Everything the UI shows, read in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSnapshot {
    pub connection_status: ConnectionStatus,
    pub peer: Option<String>,
    pub raw_text: Option<String>,
    pub moisture_value: Option<i32>,
    pub active_alert: Option<String>,
    pub notice: Option<String>,
}

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Current connection status.
    pub connection_status: RwLock<ConnectionStatus>,

    /// Address of the connected sensor.
    pub peer: RwLock<Option<String>>,

    /// Generation of the current connection. Messages from other generations are stale.
    pub generation: RwLock<u64>,

    /// Last raw text received, shown as soon as it arrives.
    pub raw_text: RwLock<Option<String>>,

    /// Last successfully interpreted moisture value.
    pub moisture_value: RwLock<Option<i32>>,

    /// Body of the alert currently on screen.
    pub active_alert: RwLock<Option<String>>,

    /// Transient message for the user, e.g. missing Bluetooth access.
    pub notice: RwLock<Option<String>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            connection_status: RwLock::new(ConnectionStatus::Disconnected),
            peer: RwLock::new(None),
            generation: RwLock::new(0),
            raw_text: RwLock::new(None),
            moisture_value: RwLock::new(None),
            active_alert: RwLock::new(None),
            notice: RwLock::new(None),
        }
    }
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        *self.connection_status.write() = status;
        if status == ConnectionStatus::Disconnected {
            *self.peer.write() = None;
        }
    }

    pub fn get_status(&self) -> ConnectionStatus {
        *self.connection_status.read()
    }

    /// Record a new connection and clear everything tied to the previous one.
    pub fn set_connected(&self, peer: String, generation: u64) {
        *self.connection_status.write() = ConnectionStatus::Connected;
        *self.peer.write() = Some(peer);
        *self.generation.write() = generation;
        *self.raw_text.write() = None;
        *self.moisture_value.write() = None;
        *self.active_alert.write() = None;
        *self.notice.write() = None;
    }

    pub fn generation(&self) -> u64 {
        *self.generation.read()
    }

    pub fn get_peer(&self) -> Option<String> {
        self.peer.read().clone()
    }

    pub fn set_raw_text(&self, text: String) {
        *self.raw_text.write() = Some(text);
    }

    pub fn get_raw_text(&self) -> Option<String> {
        self.raw_text.read().clone()
    }

    pub fn set_moisture_value(&self, value: i32) {
        *self.moisture_value.write() = Some(value);
    }

    pub fn get_moisture_value(&self) -> Option<i32> {
        *self.moisture_value.read()
    }

    pub fn set_active_alert(&self, body: Option<String>) {
        *self.active_alert.write() = body;
    }

    pub fn get_active_alert(&self) -> Option<String> {
        self.active_alert.read().clone()
    }

    pub fn set_notice(&self, notice: String) {
        *self.notice.write() = Some(notice);
    }

    pub fn clear_notice(&self) {
        *self.notice.write() = None;
    }

    pub fn get_notice(&self) -> Option<String> {
        self.notice.read().clone()
    }

    pub fn snapshot(&self) -> UiSnapshot {
        UiSnapshot {
            connection_status: self.get_status(),
            peer: self.get_peer(),
            raw_text: self.get_raw_text(),
            moisture_value: self.get_moisture_value(),
            active_alert: self.get_active_alert(),
            notice: self.get_notice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_clears_alert_state() {
        let state = AppState::new();
        state.set_raw_text("812".to_string());
        state.set_moisture_value(812);
        state.set_active_alert(Some("too wet".to_string()));
        state.set_notice("Bluetooth not enabled".to_string());

        state.set_connected("00:23:00:00:5F:1A".to_string(), 2);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.connection_status, ConnectionStatus::Connected);
        assert_eq!(snapshot.peer.as_deref(), Some("00:23:00:00:5F:1A"));
        assert_eq!(snapshot.raw_text, None);
        assert_eq!(snapshot.moisture_value, None);
        assert_eq!(snapshot.active_alert, None);
        assert_eq!(snapshot.notice, None);
        assert_eq!(state.generation(), 2);
    }

    #[test]
    fn test_disconnect_forgets_peer_but_keeps_last_value() {
        let state = AppState::new();
        state.set_connected("00:23:00:00:5F:1A".to_string(), 1);
        state.set_moisture_value(450);

        state.set_status(ConnectionStatus::Disconnected);

        assert_eq!(state.get_peer(), None);
        assert_eq!(state.get_moisture_value(), Some(450));
        assert_eq!(state.get_status().as_str(), "Not Connected");
    }
}
