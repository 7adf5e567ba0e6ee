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

//! Background read loop for a live sensor connection.

use futures::FutureExt;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connection::{Connection, SensorEvent};
use super::transport::ByteStream;
use crate::error::ReadError;

const READ_BUFFER_SIZE: usize = 1024;

/// Reads text chunks from the sensor until the stream fails or is cancelled.
pub struct StreamReader {
    connection: Connection,
    event_tx: mpsc::Sender<SensorEvent>,
    cancel: CancellationToken,
}

impl StreamReader {
    /// Create a reader. `cancel` is also cancelled by the reader when it exits,
    /// so its state doubles as the liveness of the link.
    pub fn new(
        connection: Connection,
        event_tx: mpsc::Sender<SensorEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connection,
            event_tx,
            cancel,
        }
    }

    /// Run the read loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the read loop.
    pub async fn run(self) {
        let generation = self.connection.generation();
        let mut stream = self.connection.into_stream();
        info!("Listening for data (generation {})", generation);

        let discarded = drain_buffered(&mut stream).await;
        if discarded > 0 {
            debug!("Discarded {} stale bytes", discarded);
        }

        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let failure = loop {
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Reader for generation {} cancelled", generation);
                    break None;
                }
                read = stream.read(&mut buffer) => read,
            };

            match read {
                Ok(0) => break Some(ReadError::Closed),
                Ok(n) => {
                    let text = String::from_utf8_lossy(&buffer[..n]).into_owned();
                    debug!("Received data: {}", text);
                    let event = SensorEvent::RawMessage { generation, text };
                    if self.event_tx.send(event).await.is_err() {
                        debug!("Event channel closed, stopping reader");
                        break None;
                    }
                }
                Err(e) => break Some(ReadError::Io(e)),
            }
        };

        self.cancel.cancel();

        if let Some(e) = failure {
            warn!("Sensor stream ended: {}", e);
            let _ = self
                .event_tx
                .send(SensorEvent::ReaderStopped {
                    generation,
                    reason: e.to_string(),
                })
                .await;
        }
    }
}

/// Discard whatever is already buffered without waiting for more.
///
/// A freshly registered socket reports no readiness until the reactor has
/// turned once, so the buffer is polled again after yielding. Bytes that
/// arrive later than that are treated as live data.
async fn drain_buffered(stream: &mut ByteStream) -> usize {
    let mut discarded = discard_ready(stream);
    tokio::task::yield_now().await;
    discarded += discard_ready(stream);
    discarded
}

fn discard_ready(stream: &mut ByteStream) -> usize {
    let mut scratch = [0u8; READ_BUFFER_SIZE];
    let mut discarded = 0;
    while let Some(Ok(n)) = stream.read(&mut scratch).now_or_never() {
        if n == 0 {
            break;
        }
        discarded += n;
    }
    discarded
}
