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

//! Platform access checks performed before connecting.

use bluer::Adapter;
use futures::future::BoxFuture;
use tracing::{info, warn};

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied(String),
}

/// Grants or refuses use of the Bluetooth hardware.
pub trait CapabilityGate: Send + Sync {
    fn check(&self) -> BoxFuture<'_, Access>;
}

/// Gate that never refuses.
pub struct AlwaysGranted;

impl CapabilityGate for AlwaysGranted {
    fn check(&self) -> BoxFuture<'_, Access> {
        Box::pin(async { Access::Granted })
    }
}

/// Gate backed by the adapter power state.
pub struct AdapterGate {
    adapter: Adapter,
    power_on: bool,
}

impl AdapterGate {
    pub fn new(adapter: Adapter, power_on: bool) -> Self {
        Self { adapter, power_on }
    }

    async fn check_adapter(&self) -> Access {
        match self.adapter.is_powered().await {
            Ok(true) => Access::Granted,
            Ok(false) if self.power_on => {
                info!("Powering on Bluetooth adapter...");
                match self.adapter.set_powered(true).await {
                    Ok(()) => Access::Granted,
                    Err(e) => {
                        warn!("Failed to power on adapter: {}", e);
                        Access::Denied("Bluetooth not enabled".to_string())
                    }
                }
            }
            Ok(false) => Access::Denied("Bluetooth not enabled".to_string()),
            Err(e) => Access::Denied(format!("Bluetooth permissions are required: {}", e)),
        }
    }
}

impl CapabilityGate for AdapterGate {
    fn check(&self) -> BoxFuture<'_, Access> {
        Box::pin(self.check_adapter())
    }
}
