// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound frame routing.
//!
//! Each text frame is parsed, logged, published as a [`BridgeEvent`],
//! dispatched to the listeners of its category, and finally relayed
//! verbatim to the client fan-out. Malformed frames stop at the parse step.

use std::sync::Arc;

use tokio::sync::broadcast;
use vb_core::{InboundMessage, ProtocolError};

use crate::events::BridgeEvent;
use crate::fanout::ClientFanout;
use crate::listeners::ListenerRegistry;

#[derive(Debug, Clone)]
pub struct InboundRouter {
    listeners: Arc<ListenerRegistry>,
    fanout: Arc<ClientFanout>,
    events: broadcast::Sender<BridgeEvent>,
}

impl InboundRouter {
    pub fn new(
        listeners: Arc<ListenerRegistry>,
        fanout: Arc<ClientFanout>,
        events: broadcast::Sender<BridgeEvent>,
    ) -> Self {
        InboundRouter {
            listeners,
            fanout,
            events,
        }
    }

    /// Routes one raw frame. Never fails the connection: a parse error is
    /// logged and returned for the caller's information only.
    pub fn route(&self, raw: &str) -> Result<InboundMessage, ProtocolError> {
        let msg = match InboundMessage::parse(raw) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, len = raw.len(), "skipping malformed frame");
                return Err(e);
            }
        };

        log_message(&msg);
        self.dispatch(&msg);
        self.fanout.broadcast(raw);
        Ok(msg)
    }

    fn dispatch(&self, msg: &InboundMessage) {
        match msg {
            InboundMessage::Transcript(t) => {
                self.listeners.transcript.dispatch(t);
            }
            InboundMessage::Interrupt(i) => {
                self.listeners.interrupt.dispatch(i);
            }
            InboundMessage::Status(s) => {
                self.listeners.status.dispatch(s);
            }
            InboundMessage::Unknown(_) => return,
            _ => {}
        }
        // no receivers is fine
        let _ = self.events.send(BridgeEvent::Message(msg.clone()));
    }
}

fn log_message(msg: &InboundMessage) {
    match msg {
        InboundMessage::Transcript(t) => {
            tracing::debug!(
                text = %t.text,
                is_final = t.is_final,
                confidence = t.confidence,
                "transcript"
            );
        }
        InboundMessage::Interrupt(i) => {
            tracing::info!(
                reason = %i.reason,
                interrupt_type = %i.interrupt_type,
                "interrupt from orchestrator"
            );
        }
        InboundMessage::Status(s) => {
            tracing::debug!(state = %s.state, "status");
        }
        InboundMessage::Synthesizing(s) => {
            tracing::debug!(
                preview = %s.preview(),
                voice_id = s.voice_id.as_deref().unwrap_or(""),
                provider = s.provider.as_deref().unwrap_or(""),
                "synthesizing"
            );
        }
        InboundMessage::Complete(c) => {
            tracing::debug!(duration = ?c.duration(), "synthesis complete");
        }
        InboundMessage::VadStart => tracing::debug!("voice activity started"),
        InboundMessage::VadEnd => tracing::debug!("voice activity ended"),
        InboundMessage::AudioOut(a) => {
            tracing::debug!(encoded_len = a.data.len(), "audio chunk");
        }
        InboundMessage::Error(e) => {
            tracing::error!(
                message = %e.message,
                code = e.code.as_deref().unwrap_or(""),
                "orchestrator error"
            );
        }
        InboundMessage::WakeWord(w) => {
            tracing::info!(word = %w.word, confidence = w.confidence, "wake word detected");
        }
        InboundMessage::Unknown(kind) => {
            tracing::debug!(%kind, "ignoring unknown message type");
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
