// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! vb-tap: connects to the voice orchestrator and logs what happens.
//!
//! Configuration comes from the file named by `VOICE_BRIDGE_CONFIG` (if set)
//! and the `VOICE_BRIDGE_*` environment variables. Raw inbound frames are
//! printed to stdout, one per line; everything else is logged to stderr.
//! Runs until Ctrl-C.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use vbridge::core::InboundMessage;
use vbridge::{BridgeConfig, BridgeEvent, VoiceBridge};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = BridgeConfig::from_env()?;
    info!(url = %config.url, session = %config.session_id, "starting tap");

    let bridge = VoiceBridge::new(config)?;
    let mut events = bridge.subscribe();

    bridge.on_transcript(|t| {
        info!(text = %t.text, is_final = t.is_final, confidence = t.confidence, "transcript");
    });
    bridge.on_interrupt(|i| {
        info!(interrupt_type = %i.interrupt_type, reason = %i.reason, "interrupt");
    });
    bridge.on_status(|s| info!(state = %s.state, "status"));

    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<String>();
    bridge.attach(Arc::new(raw_tx));

    bridge.connect().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, closing");
                break;
            }
            Some(raw) = raw_rx.recv() => println!("{}", raw),
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    bridge.close().await;
    Ok(())
}

fn log_event(event: &BridgeEvent) {
    match event {
        BridgeEvent::StateChanged { from, to } => info!(%from, %to, "state"),
        BridgeEvent::Connected { url } => info!(%url, "connected"),
        BridgeEvent::Disconnected { reason } => warn!(%reason, "disconnected"),
        BridgeEvent::Reconnecting { attempt, delay } => {
            info!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting");
        }
        BridgeEvent::Fatal { attempts, message } => {
            error!(attempts, detail = %message, "gave up reconnecting");
        }
        BridgeEvent::InterruptSent(signal) => info!(kind = %signal.kind, "interrupt sent"),
        BridgeEvent::Message(msg) => log_message(msg),
    }
}

// Transcripts, interrupts and statuses are logged by their listeners.
fn log_message(msg: &InboundMessage) {
    match msg {
        InboundMessage::Synthesizing(s) => info!(text = %s.preview(), "synthesizing"),
        InboundMessage::Complete(c) => {
            info!(duration_ms = c.duration_ms, "synthesis complete");
        }
        InboundMessage::AudioOut(_) => debug!("audio chunk"),
        InboundMessage::Error(e) => {
            let code = e.code.as_deref().unwrap_or("");
            error!(detail = %e.message, code, "orchestrator error");
        }
        InboundMessage::WakeWord(w) => {
            info!(word = %w.word, confidence = w.confidence, "wake word");
        }
        other => debug!(kind = other.kind(), "message"),
    }
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
