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

//! Soil moisture reading interpretation.
//!
//! The sensor sends its raw value as an ASCII integer. Values above the
//! high threshold mean the soil is too wet, values below the low threshold
//! mean it is too dry.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ParseError;

const HIGH_MESSAGE: &str = "The Soil Moisture is High, please checkup on the system.";
const LOW_MESSAGE: &str = "The Soil Moisture is Low, please checkup on the system.";

/// Alert thresholds for the raw sensor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub low: i32,
    pub high: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 300,
            high: 700,
        }
    }
}

/// A decoded sensor value.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: i32,
    pub received_at: DateTime<Local>,
}

/// Which threshold was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    High,
    Low,
}

impl AlertKind {
    pub fn message(&self) -> &'static str {
        match self {
            AlertKind::High => HIGH_MESSAGE,
            AlertKind::Low => LOW_MESSAGE,
        }
    }
}

/// Alert raised when a reading leaves the allowed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub message: String,
}

impl AlertEvent {
    pub fn new(kind: AlertKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
        }
    }
}

/// Parse a raw message into a moisture value.
pub fn parse_value(text: &str) -> Result<i32, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    trimmed.parse::<i32>().map_err(|source| ParseError::Invalid {
        input: trimmed.to_string(),
        source,
    })
}

/// Turns raw messages into readings and readings into alerts.
#[derive(Debug, Clone, Default)]
pub struct MoistureInterpreter {
    thresholds: Thresholds,
}

impl MoistureInterpreter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Decode a raw message. Malformed input is logged and dropped.
    pub fn interpret(&self, text: &str) -> Option<Reading> {
        match parse_value(text) {
            Ok(value) => {
                debug!("Soil moisture reading: {}", value);
                Some(Reading {
                    value,
                    received_at: Local::now(),
                })
            }
            Err(e) => {
                warn!("Failed to parse soil moisture value: {}", e);
                None
            }
        }
    }

    /// Compare a reading against the thresholds. Both bounds are inclusive.
    pub fn classify(&self, reading: &Reading) -> Option<AlertEvent> {
        if reading.value > self.thresholds.high {
            Some(AlertEvent::new(AlertKind::High))
        } else if reading.value < self.thresholds.low {
            Some(AlertEvent::new(AlertKind::Low))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert_for(value: i32) -> Option<AlertKind> {
        let interpreter = MoistureInterpreter::default();
        let reading = interpreter.interpret(&value.to_string()).unwrap();
        interpreter.classify(&reading).map(|alert| alert.kind)
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(alert_for(701), Some(AlertKind::High));
        assert_eq!(alert_for(700), None);
        assert_eq!(alert_for(500), None);
        assert_eq!(alert_for(300), None);
        assert_eq!(alert_for(299), Some(AlertKind::Low));
    }

    #[test]
    fn test_extreme_values() {
        assert_eq!(alert_for(i32::MAX), Some(AlertKind::High));
        assert_eq!(alert_for(i32::MIN), Some(AlertKind::Low));
        assert_eq!(alert_for(-1), Some(AlertKind::Low));
    }

    #[test]
    fn test_classification_over_full_range() {
        let interpreter = MoistureInterpreter::default();
        for value in -100..1100 {
            let reading = Reading {
                value,
                received_at: Local::now(),
            };
            let kind = interpreter.classify(&reading).map(|alert| alert.kind);
            let expected = if value > 700 {
                Some(AlertKind::High)
            } else if value < 300 {
                Some(AlertKind::Low)
            } else {
                None
            };
            assert_eq!(kind, expected, "value {}", value);
        }
    }

    #[test]
    fn test_whitespace_is_ignored() {
        let interpreter = MoistureInterpreter::default();

        let padded = interpreter.interpret("  742 \n").unwrap();
        let plain = interpreter.interpret("742").unwrap();

        assert_eq!(padded.value, plain.value);
        assert_eq!(
            interpreter.classify(&padded),
            interpreter.classify(&plain)
        );
    }

    #[test]
    fn test_garbage_produces_no_reading() {
        let interpreter = MoistureInterpreter::default();

        assert!(interpreter.interpret("abc").is_none());
        assert!(interpreter.interpret("").is_none());
        assert!(interpreter.interpret("   \r\n").is_none());
        assert!(interpreter.interpret("12.5").is_none());
        assert!(interpreter.interpret("742\n743").is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_value(" \n"), Err(ParseError::Empty));
        assert!(matches!(
            parse_value("abc"),
            Err(ParseError::Invalid { ref input, .. }) if input == "abc"
        ));
        assert_eq!(parse_value("-15"), Ok(-15));
    }

    #[test]
    fn test_alert_messages() {
        let high = AlertEvent::new(AlertKind::High);
        let low = AlertEvent::new(AlertKind::Low);

        assert!(high.message.contains("High"));
        assert!(low.message.contains("Low"));
    }

    #[test]
    fn test_custom_thresholds() {
        let interpreter = MoistureInterpreter::new(Thresholds { low: 10, high: 20 });
        let reading = interpreter.interpret("25").unwrap();

        assert_eq!(
            interpreter.classify(&reading).map(|alert| alert.kind),
            Some(AlertKind::High)
        );
    }
}
