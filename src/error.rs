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

//! Error types for the sensor pipeline.
//!
//! None of these are fatal to the process. Connect and read failures are
//! recovered by the next health tick, parse failures drop the reading.

use std::num::ParseIntError;

/// Failure while establishing the link to the sensor.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The platform refused access to Bluetooth.
    #[error("Bluetooth access denied: {0}")]
    PermissionDenied(String),

    /// The peer is not known to the adapter.
    #[error("Device {0} is not available")]
    DeviceUnavailable(String),

    /// The peer does not advertise the serial port profile.
    #[error("Device {0} does not offer the serial port service")]
    ServiceNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every attempt in the connect cycle failed.
    #[error("Connection failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: String },

    /// Shutdown was requested during the connect cycle.
    #[error("Connect cycle cancelled")]
    Cancelled,
}

impl ConnectError {
    /// Map a socket error, keeping access refusals apart from ordinary failures.
    pub fn from_socket(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Io(err),
        }
    }
}

/// Failure while streaming from a live connection.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote side closed the stream.
    #[error("Connection closed by remote")]
    Closed,
}

/// A message that is not a moisture value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty moisture payload")]
    Empty,

    #[error("Invalid moisture payload '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: ParseIntError,
    },
}

/// Invalid values in the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid device address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid thresholds: low ({low}) must be below high ({high})")]
    InvalidThresholds { low: i32, high: i32 },

    #[error("Retry budget must allow at least one attempt")]
    NoAttempts,

    #[error("Health check interval must be greater than zero")]
    ZeroInterval,
}
