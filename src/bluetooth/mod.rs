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

//! Bluetooth communication module.
//!
//! Handles the RFCOMM client link to the soil moisture sensor.

mod connection;
mod connector;
mod gate;
mod reader;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{Connection, SensorEvent};
pub use connector::{Connector, RetryPolicy};
pub use gate::{Access, AdapterGate, AlwaysGranted, CapabilityGate};
pub use reader::StreamReader;
pub use transport::{ByteStream, RfcommTransport, Transport, SPP_UUID};
