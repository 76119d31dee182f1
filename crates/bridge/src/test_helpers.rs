// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for bridge tests.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio::sync::broadcast;

use crate::transport_tests::MockTransport;
use crate::{BridgeConfig, BridgeEvent, ConnectionState, Transport, VoiceBridge};

/// Longest a test waits for something to happen, in paused (virtual) time.
pub const WAIT: Duration = Duration::from_secs(600);

/// Defaults with a short backoff schedule: 1s doubling up to 8s, 3 attempts.
pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::new("ws://orchestrator.test:8765");
    config.session_id = "test-session".to_string();
    config.initial_reconnect_delay = Duration::from_secs(1);
    config.max_reconnect_delay = Duration::from_secs(8);
    config.max_reconnects = 3;
    config
}

pub fn make_bridge(config: BridgeConfig) -> (VoiceBridge<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    let bridge = VoiceBridge::with_transport(config, transport.clone()).unwrap();
    (bridge, transport)
}

/// Polls `cond` until it holds, letting virtual time advance.
pub async fn wait_for<F: Fn() -> bool>(what: &str, cond: F) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn wait_for_state<T: Transport>(bridge: &VoiceBridge<T>, state: ConnectionState) {
    wait_for(&format!("state {}", state), || bridge.state() == state).await;
}

/// Receives events until one matches `pred`, returning it.
pub async fn next_event<F>(rx: &mut broadcast::Receiver<BridgeEvent>, mut pred: F) -> BridgeEvent
where
    F: FnMut(&BridgeEvent) -> bool,
{
    let found = tokio::time::timeout(WAIT, async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await;
    found.unwrap()
}

/// Events already published, without waiting.
pub fn drain_events(rx: &mut broadcast::Receiver<BridgeEvent>) -> Vec<BridgeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// `text` fields of the synthesize frames in `frames`, in order.
pub fn synthesized_texts(frames: &[String]) -> Vec<String> {
    frames
        .iter()
        .filter_map(|raw| {
            let v: serde_json::Value = serde_json::from_str(raw).unwrap();
            (v["type"] == "synthesize").then(|| v["text"].as_str().unwrap().to_string())
        })
        .collect()
}
