// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! vbridge: Resilient streaming client for the voice orchestrator.
//!
//! The [`VoiceBridge`] keeps one duplex connection to the orchestrator
//! alive and gives the application a stable interface across reconnects:
//!
//! - typed outbound messages ([`VoiceBridge::send`], [`VoiceBridge::cancel`],
//!   [`VoiceBridge::send_config`], [`VoiceBridge::send_audio`])
//! - a priority path for interrupts ([`VoiceBridge::send_interrupt`])
//! - per-category listeners for inbound transcripts, interrupts and status
//! - raw passthrough of inbound frames to attached local clients
//! - connection and message events on a broadcast channel
//!
//! While the link is down, frames are held in a bounded drop-oldest queue
//! and flushed in order on reconnection. A heartbeat detects silent
//! connection death.

mod backoff;
mod bridge;
mod config;
mod dispatch;
pub mod env;
mod error;
mod events;
mod fanout;
mod heartbeat;
mod listeners;
mod queue;
mod router;
mod state;
mod transport;

pub use backoff::Backoff;
pub use bridge::VoiceBridge;
pub use config::{BridgeConfig, ConfigError, ConfigFile};
pub use error::{BridgeError, Result};
pub use events::BridgeEvent;
pub use fanout::{ClientFanout, PassthroughSink, SinkError, SinkId};
pub use heartbeat::{HeartbeatExit, HeartbeatMonitor, Liveness};
pub use listeners::{ListenerList, ListenerRegistry};
pub use queue::PendingQueue;
pub use router::InboundRouter;
pub use state::ConnectionState;
pub use transport::{
    BoxFuture, Frame, FrameSink, FrameStream, Link, Transport, TransportError, TransportResult,
    WebSocketTransport,
};

pub use vb_core as core;

#[cfg(test)]
mod test_helpers;
