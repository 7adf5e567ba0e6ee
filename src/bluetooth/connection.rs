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

//! A live sensor connection and the events it produces.

use bluer::Address;

use super::transport::ByteStream;
use crate::state::ConnectionStatus;

/// Events emitted by the monitor and the stream reader.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// Result of a health check.
    Status(ConnectionStatus),
    /// A new connection replaced whatever came before.
    Connected { peer: String, generation: u64 },
    /// Text received from the sensor.
    RawMessage { generation: u64, text: String },
    /// The reader for `generation` hit an I/O error or end of stream.
    ReaderStopped { generation: u64, reason: String },
    /// The platform refused Bluetooth access.
    PermissionDenied(String),
    /// A connect cycle failed.
    Error(String),
}

/// An established stream to the sensor.
///
/// Owned by exactly one reader once handed over.
pub struct Connection {
    peer: Address,
    generation: u64,
    stream: ByteStream,
}

impl Connection {
    pub fn new(peer: Address, generation: u64, stream: ByteStream) -> Self {
        Self {
            peer,
            generation,
            stream,
        }
    }

    pub fn peer(&self) -> Address {
        self.peer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn into_stream(self) -> ByteStream {
        self.stream
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
