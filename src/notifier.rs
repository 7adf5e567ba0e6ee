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

//! Alert presentation.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::moisture::{AlertEvent, AlertKind};
use crate::state::AppState;

pub const ALERT_TITLE: &str = "Soil Moisture Alert";

/// All alerts share one slot, so a newer alert replaces the one on screen.
pub const ALERT_NOTIFICATION_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
}

/// A notification as handed to the presentation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u32,
    pub title: String,
    pub body: String,
    pub priority: Priority,
}

impl Notification {
    pub fn alert(alert: &AlertEvent) -> Self {
        Self {
            id: ALERT_NOTIFICATION_ID,
            title: ALERT_TITLE.to_string(),
            body: alert.message.clone(),
            priority: Priority::High,
        }
    }
}

/// Trait for notification backends.
pub trait Notifier: Send + Sync {
    /// Get the backend name.
    fn backend_name(&self) -> &'static str;

    /// Show or replace the notification with `notification.id`.
    fn show(&self, notification: &Notification) -> Result<()>;

    /// Remove the notification with `id` if it is still shown.
    fn dismiss(&self, id: u32) -> Result<()>;
}

/// Notifier that surfaces alerts through the shared state (read by the tray).
pub struct StateNotifier {
    state: Arc<AppState>,
}

impl StateNotifier {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl Notifier for StateNotifier {
    fn backend_name(&self) -> &'static str {
        "Tray"
    }

    fn show(&self, notification: &Notification) -> Result<()> {
        warn!("{}: {}", notification.title, notification.body);
        self.state.set_active_alert(Some(notification.body.clone()));
        Ok(())
    }

    fn dismiss(&self, _id: u32) -> Result<()> {
        self.state.set_active_alert(None);
        Ok(())
    }
}

/// Sends alerts to the notifier and takes them down again after a while.
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    auto_dismiss: Duration,
    shutdown: CancellationToken,
}

impl AlertDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        auto_dismiss: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        info!("Alert backend: {}", notifier.backend_name());
        Self {
            notifier,
            auto_dismiss,
            shutdown,
        }
    }

    /// Show an alert and schedule its dismissal.
    pub fn dispatch(&self, alert: &AlertEvent) -> Result<()> {
        let notification = Notification::alert(alert);
        self.notifier.show(&notification)?;
        info!("{:?} moisture alert sent", alert.kind);

        let notifier = self.notifier.clone();
        let shutdown = self.shutdown.clone();
        let delay = self.auto_dismiss;
        let id = notification.id;
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Err(e) = notifier.dismiss(id) {
                        error!("Failed to dismiss notification: {}", e);
                    }
                }
            }
        });

        Ok(())
    }

    /// Fire an alert regardless of what the sensor reports.
    pub fn trigger(&self, kind: AlertKind) -> Result<()> {
        info!("Manual {:?} alert triggered", kind);
        self.dispatch(&AlertEvent::new(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        shown: Mutex<Vec<Notification>>,
        dismissed: Mutex<Vec<u32>>,
    }

    impl Notifier for Recorder {
        fn backend_name(&self) -> &'static str {
            "recorder"
        }

        fn show(&self, notification: &Notification) -> Result<()> {
            self.shown.lock().push(notification.clone());
            Ok(())
        }

        fn dismiss(&self, id: u32) -> Result<()> {
            self.dismissed.lock().push(id);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_is_dismissed_after_window() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = AlertDispatcher::new(
            recorder.clone(),
            Duration::from_secs(5),
            CancellationToken::new(),
        );

        dispatcher.trigger(AlertKind::High).unwrap();

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert!(recorder.dismissed.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*recorder.dismissed.lock(), vec![ALERT_NOTIFICATION_ID]);

        let shown = recorder.shown.lock();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, ALERT_TITLE);
        assert_eq!(shown[0].priority, Priority::High);
        assert!(shown[0].body.contains("High"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_notifier_shows_and_clears() {
        let state = AppState::new();
        let dispatcher = AlertDispatcher::new(
            Arc::new(StateNotifier::new(state.clone())),
            Duration::from_secs(5),
            CancellationToken::new(),
        );

        dispatcher.trigger(AlertKind::Low).unwrap();
        assert!(state.get_active_alert().unwrap().contains("Low"));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(state.get_active_alert(), None);
    }
}
