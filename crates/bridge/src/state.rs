// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state of the bridge and its legal transitions.

use std::fmt;

/// State of the orchestrator connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not connected. Initial state, after `close`, and after a fatal give-up.
    Disconnected,
    /// Initial handshake in progress.
    Connecting,
    /// Connected; frames are written directly.
    Connected,
    /// Link lost; frames are queued while the backoff loop redials.
    Reconnecting,
}

impl ConnectionState {
    /// Whether `self -> next` is an edge of the state graph.
    ///
    /// Any state may fall back to `Disconnected` (close or fatal give-up).
    /// Self-loops are not transitions.
    pub fn permits(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (from, to) if from == to => false,
            (_, Disconnected) => true,
            (Disconnected, Connecting) => true,
            (Connecting, Connected) => true,
            (Connected, Reconnecting) => true,
            (Reconnecting, Connected) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
