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

//! Byte-stream transports to the sensor.

use anyhow::Result;
use bluer::rfcomm::{SocketAddr, Stream};
use bluer::{Adapter, Address};
use futures::future::BoxFuture;
use std::pin::Pin;
use tokio::io::AsyncRead;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ConnectError;

/// Standard SPP UUID.
pub const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Readable half of a live connection.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Something that can open a byte stream to a peer.
pub trait Transport: Send + Sync {
    /// Get the transport name (e.g., "RFCOMM").
    fn name(&self) -> &'static str;

    /// Make a single connection attempt.
    fn open(&self, peer: Address) -> BoxFuture<'_, Result<ByteStream, ConnectError>>;
}

/// RFCOMM client transport backed by BlueZ.
pub struct RfcommTransport {
    adapter: Adapter,
    channel: u8,
}

impl RfcommTransport {
    /// Create a transport on the default adapter.
    pub async fn new(channel: u8) -> Result<Self> {
        // Create BlueZ session
        let session = bluer::Session::new().await?;
        info!("BlueZ session created");

        // Get the default adapter
        let adapter = session.default_adapter().await?;
        info!("Using Bluetooth adapter: {}", adapter.name());

        Ok(Self { adapter, channel })
    }

    /// Get the adapter this transport connects through.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    async fn connect(&self, peer: Address) -> Result<Stream, ConnectError> {
        let device = self
            .adapter
            .device(peer)
            .map_err(|_| ConnectError::DeviceUnavailable(peer.to_string()))?;

        // Only fail when BlueZ has resolved the services and SPP is missing.
        match device.uuids().await {
            Ok(Some(uuids)) if !uuids.contains(&SPP_UUID) => {
                return Err(ConnectError::ServiceNotFound(peer.to_string()));
            }
            Ok(_) => {}
            Err(e) => debug!("Service lookup for {} unavailable: {}", peer, e),
        }

        let stream = Stream::connect(SocketAddr::new(peer, self.channel))
            .await
            .map_err(ConnectError::from_socket)?;
        debug!("RFCOMM stream open to {} on channel {}", peer, self.channel);
        Ok(stream)
    }
}

impl Transport for RfcommTransport {
    fn name(&self) -> &'static str {
        "RFCOMM"
    }

    fn open(&self, peer: Address) -> BoxFuture<'_, Result<ByteStream, ConnectError>> {
        Box::pin(async move {
            let stream = self.connect(peer).await?;
            Ok(Box::pin(stream) as ByteStream)
        })
    }
}
