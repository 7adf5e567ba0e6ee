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

//! Connect cycle with a bounded retry budget.

use bluer::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::connection::Connection;
use super::transport::Transport;
use crate::error::ConnectError;

/// How many times to try per cycle and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per connect cycle.
    pub max_attempts: u32,
    /// Delay after the first failure. Zero means retry immediately.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Calculate the delay that follows `current`, clamped to `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next_ms = (current.as_millis() as f64 * self.multiplier) as u64;
        Duration::from_millis(next_ms).min(self.max_delay)
    }
}

/// Opens connections to the one sensor this process watches.
pub struct Connector {
    transport: Arc<dyn Transport>,
    peer: Address,
    policy: RetryPolicy,
}

impl Connector {
    pub fn new(transport: Arc<dyn Transport>, peer: Address, policy: RetryPolicy) -> Self {
        Self {
            transport,
            peer,
            policy,
        }
    }

    pub fn peer(&self) -> Address {
        self.peer
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one connect cycle of at most `max_attempts` tries.
    ///
    /// The returned connection is tagged with `generation`.
    pub async fn connect(
        &self,
        generation: u64,
        cancel: &CancellationToken,
    ) -> Result<Connection, ConnectError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.initial_delay;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            info!(
                "Connecting to {} over {} (attempt {}/{})",
                self.peer,
                self.transport.name(),
                attempt,
                max_attempts
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ConnectError::Cancelled),
                result = self.transport.open(self.peer) => result,
            };

            match result {
                Ok(stream) => {
                    info!("Connected to {}", self.peer);
                    return Ok(Connection::new(self.peer, generation, stream));
                }
                Err(ConnectError::PermissionDenied(reason)) => {
                    return Err(ConnectError::PermissionDenied(reason));
                }
                Err(e) => {
                    warn!("Connect attempt {} failed: {}", attempt, e);
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts && !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ConnectError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                delay = self.policy.next_delay(delay);
            }
        }

        Err(ConnectError::Exhausted {
            attempts: max_attempts,
            last: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::testing::{ScriptedTransport, PEER};
    use tokio::time::Instant;

    #[test]
    fn test_next_delay_doubles_and_clamps() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(1),
            ..Default::default()
        };

        let mut delay = policy.initial_delay;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(delay.as_millis());
            delay = policy.next_delay(delay);
        }

        assert_eq!(seen, vec![250, 500, 1000, 1000]);
    }

    #[test]
    fn test_zero_delay_stays_zero() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(Duration::ZERO), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let transport = Arc::new(ScriptedTransport::refusing());
        let connector = Connector::new(transport.clone(), PEER, RetryPolicy::default());

        let result = connector.connect(1, &CancellationToken::new()).await;

        assert!(matches!(
            result,
            Err(ConnectError::Exhausted { attempts: 3, .. })
        ));
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_failure();
        let _sensor = transport.push_link();
        let connector = Connector::new(transport.clone(), PEER, RetryPolicy::default());

        let connection = connector.connect(7, &CancellationToken::new()).await.unwrap();

        assert_eq!(transport.attempts(), 2);
        assert_eq!(connection.generation(), 7);
        assert_eq!(connection.peer(), PEER);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_between_attempts() {
        let transport = Arc::new(ScriptedTransport::refusing());
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        };
        let connector = Connector::new(transport.clone(), PEER, policy);

        let started = Instant::now();
        let result = connector.connect(1, &CancellationToken::new()).await;

        assert!(result.is_err());
        // 100ms after the first failure, 200ms after the second, none after the last.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(400), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_permission_denied_ends_cycle() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_denied();
        let _sensor = transport.push_link();
        let connector = Connector::new(transport.clone(), PEER, RetryPolicy::default());

        let result = connector.connect(1, &CancellationToken::new()).await;

        assert!(matches!(result, Err(ConnectError::PermissionDenied(_))));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_cycle_does_not_connect() {
        let transport = Arc::new(ScriptedTransport::default());
        let _sensor = transport.push_link();
        let connector = Connector::new(transport.clone(), PEER, RetryPolicy::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = connector.connect(1, &cancel).await;

        assert!(matches!(result, Err(ConnectError::Cancelled)));
    }
}
