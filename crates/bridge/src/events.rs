// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous notifications published by the bridge.

use std::time::Duration;

use vb_core::{InboundMessage, InterruptSignal};

use crate::state::ConnectionState;

/// Capacity of the event broadcast channel. Slow subscribers lag and skip.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// The authoritative state changed.
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// A connection was established (first connect or reconnect).
    Connected { url: String },
    /// A live connection was lost. Reconnection follows.
    Disconnected { reason: String },
    /// A reconnection attempt is scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnection gave up. The bridge stays disconnected until `connect`.
    Fatal { attempts: u32, message: String },
    /// An interrupt was handed to the writer.
    InterruptSent(InterruptSignal),
    /// A recognized message arrived from the orchestrator.
    Message(InboundMessage),
}
