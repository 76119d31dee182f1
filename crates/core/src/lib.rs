// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! vb-core: Wire schema shared by the voice bridge and its tools.
//!
//! This crate defines the JSON frames exchanged with the voice orchestrator
//! and the interrupt signal carried on the bridge's priority path. It does
//! no I/O.

pub mod error;
pub mod interrupt;
pub mod protocol;

pub use error::{ProtocolError, Result};
pub use interrupt::{InterruptKind, InterruptSignal};
pub use protocol::{
    AudioChunk, Completion, Envelope, InboundMessage, InterruptNotice, Metadata,
    OrchestratorError, OutboundMessage, StatusUpdate, Synthesizing, Transcript, WakeWord,
};
