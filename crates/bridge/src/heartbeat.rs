// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness probing for a live connection.
//!
//! The monitor sends a probe on every tick and gives up on the link once no
//! acknowledgment has been seen for longer than the timeout. It returns on
//! the first stale check, so a connection is reported dead at most once.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Last time the peer acknowledged a probe.
#[derive(Debug)]
pub struct Liveness {
    last_seen: Mutex<Instant>,
}

impl Liveness {
    pub fn new() -> Self {
        Liveness {
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Records an acknowledgment.
    pub fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// Time since the last acknowledgment (or since creation).
    pub fn elapsed(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the monitor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatExit {
    /// The connection was cancelled.
    Cancelled,
    /// No acknowledgment within the timeout.
    Stale { silent_for: Duration },
    /// The probe could not be handed to the writer.
    ProbeFailed,
}

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatMonitor {
    interval: Duration,
    timeout: Duration,
}

impl HeartbeatMonitor {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        HeartbeatMonitor { interval, timeout }
    }

    /// Runs until cancelled or the link is judged dead.
    ///
    /// `probe` queues one liveness probe and returns false when the link is
    /// already gone.
    pub async fn run<F>(
        &self,
        liveness: &Liveness,
        cancel: &CancellationToken,
        mut probe: F,
    ) -> HeartbeatExit
    where
        F: FnMut() -> bool,
    {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return HeartbeatExit::Cancelled,
                _ = ticker.tick() => {}
            }

            let silent_for = liveness.elapsed();
            if silent_for > self.timeout {
                tracing::warn!(?silent_for, timeout = ?self.timeout, "heartbeat timed out");
                return HeartbeatExit::Stale { silent_for };
            }

            if !probe() {
                return HeartbeatExit::ProbeFailed;
            }
            tracing::debug!("ping sent");
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
