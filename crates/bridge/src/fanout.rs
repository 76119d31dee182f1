// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Raw passthrough of inbound frames to locally attached clients.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

/// Error delivering a frame to a passthrough sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("sink closed")]
    Closed,

    #[error("sink full")]
    Full,

    #[error("sink failed: {0}")]
    Other(String),
}

/// A local consumer of raw orchestrator frames, such as a UI socket.
///
/// `deliver` must not block: it runs on the bridge's read loop.
pub trait PassthroughSink: Send + Sync {
    fn deliver(&self, frame: &str) -> Result<(), SinkError>;

    /// Called once when the bridge shuts down.
    fn close(&self) {}
}

impl PassthroughSink for mpsc::Sender<String> {
    fn deliver(&self, frame: &str) -> Result<(), SinkError> {
        self.try_send(frame.to_string()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

impl PassthroughSink for mpsc::UnboundedSender<String> {
    fn deliver(&self, frame: &str) -> Result<(), SinkError> {
        self.send(frame.to_string()).map_err(|_| SinkError::Closed)
    }
}

/// Handle returned by [`ClientFanout::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SinkId(u64);

impl std::fmt::Display for SinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sink-{}", self.0)
    }
}

/// Set of attached passthrough sinks.
///
/// Attach and detach may run concurrently with `broadcast`, which delivers
/// to a snapshot of the set outside the lock.
pub struct ClientFanout {
    sinks: RwLock<BTreeMap<SinkId, Arc<dyn PassthroughSink>>>,
    next_id: AtomicU64,
}

impl ClientFanout {
    pub fn new() -> Self {
        ClientFanout {
            sinks: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn attach(&self, sink: Arc<dyn PassthroughSink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sinks.write().insert(id, sink);
        tracing::debug!(%id, "passthrough sink attached");
        id
    }

    /// Removes a sink. Returns false if it was not attached.
    pub fn detach(&self, id: SinkId) -> bool {
        let removed = self.sinks.write().remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "passthrough sink detached");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Delivers `frame` to every sink, dropping the ones that fail.
    ///
    /// Returns the number of sinks that received the frame.
    pub fn broadcast(&self, frame: &str) -> usize {
        let snapshot: Vec<(SinkId, Arc<dyn PassthroughSink>)> = self
            .sinks
            .read()
            .iter()
            .map(|(id, sink)| (*id, Arc::clone(sink)))
            .collect();

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, sink) in snapshot {
            match sink.deliver(frame) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(%id, error = %e, "dropping passthrough sink");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut sinks = self.sinks.write();
            for id in failed {
                sinks.remove(&id);
            }
        }
        delivered
    }

    /// Detaches and closes every sink.
    pub fn close_all(&self) {
        let sinks = std::mem::take(&mut *self.sinks.write());
        for sink in sinks.values() {
            sink.close();
        }
    }
}

impl Default for ClientFanout {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFanout")
            .field("sinks", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
