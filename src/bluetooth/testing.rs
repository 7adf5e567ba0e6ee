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

//! In-memory transport for unit tests.

use bluer::Address;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::io::DuplexStream;

use super::transport::{ByteStream, Transport};
use crate::error::ConnectError;

pub const PEER: Address = Address::new([0x00, 0x23, 0x00, 0x00, 0x5F, 0x1A]);

enum Outcome {
    Link(DuplexStream),
    Refused,
    Denied,
}

/// Transport that replays a queue of outcomes. An empty queue refuses.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Outcome>>,
    attempts: AtomicU32,
}

impl ScriptedTransport {
    pub fn refusing() -> Self {
        Self::default()
    }

    /// Queue a failed attempt.
    pub fn push_failure(&self) {
        self.outcomes.lock().push_back(Outcome::Refused);
    }

    /// Queue an attempt the platform refuses for lack of permission.
    pub fn push_denied(&self) {
        self.outcomes.lock().push_back(Outcome::Denied);
    }

    /// Queue a successful attempt; the returned end acts as the sensor.
    pub fn push_link(&self) -> DuplexStream {
        let (local, remote) = tokio::io::duplex(1024);
        self.outcomes.lock().push_back(Outcome::Link(local));
        remote
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn open(&self, _peer: Address) -> BoxFuture<'_, Result<ByteStream, ConnectError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcomes.lock().pop_front().unwrap_or(Outcome::Refused);
        Box::pin(async move {
            match outcome {
                Outcome::Link(stream) => Ok(Box::pin(stream) as ByteStream),
                Outcome::Refused => Err(ConnectError::from_socket(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "host is down",
                ))),
                Outcome::Denied => Err(ConnectError::from_socket(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "operation not permitted",
                ))),
            }
        })
    }
}
