// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Interrupt signals sent upstream on the priority path.
//!
//! An interrupt (barge-in, wake word, user cancel) must never wait behind
//! normal traffic, so it travels on its own channel and is written before
//! any queued frame.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::protocol::Metadata;

/// Category of an interrupt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterruptKind {
    /// The user started speaking over playback.
    BargeIn,
    /// A wake word was detected.
    WakeWord,
    /// The user explicitly cancelled.
    UserCancel,
    /// The conversation moved on and the current response is stale.
    TopicShift,
    /// Raised by the application itself.
    System,
    /// Any other label, passed through verbatim.
    Other(String),
}

impl InterruptKind {
    /// Maps a wire label to a kind; unrecognized labels become [`InterruptKind::Other`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "barge_in" => InterruptKind::BargeIn,
            "wake_word" => InterruptKind::WakeWord,
            "user_cancel" => InterruptKind::UserCancel,
            "topic_shift" => InterruptKind::TopicShift,
            "system" => InterruptKind::System,
            other => InterruptKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InterruptKind::BargeIn => "barge_in",
            InterruptKind::WakeWord => "wake_word",
            InterruptKind::UserCancel => "user_cancel",
            InterruptKind::TopicShift => "topic_shift",
            InterruptKind::System => "system",
            InterruptKind::Other(label) => label,
        }
    }
}

impl fmt::Display for InterruptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterruptKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

/// An interrupt travelling upstream to the orchestrator.
///
/// Timestamps are kept at millisecond precision, which is what the wire
/// format carries.
#[derive(Debug, Clone, PartialEq)]
pub struct InterruptSignal {
    pub kind: InterruptKind,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Metadata,
}

impl InterruptSignal {
    /// Creates a signal stamped with the current time.
    pub fn new(kind: InterruptKind, reason: impl Into<String>) -> Self {
        InterruptSignal {
            kind,
            reason: reason.into(),
            timestamp: truncate_to_millis(Utc::now()),
            metadata: Metadata::new(),
        }
    }

    /// Replaces the timestamp (truncated to milliseconds).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = truncate_to_millis(timestamp);
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

/// Converts a timestamp into the float seconds used on the wire.
pub fn to_unix_seconds(ts: DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64 / 1000.0
}

/// Converts wire float seconds back into a timestamp.
pub fn from_unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
