// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for bridge operations.

use std::time::Duration;

use thiserror::Error;
use vb_core::ProtocolError;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Errors returned synchronously to bridge callers.
///
/// Failures detected by background loops are not returned here; they are
/// published as [`BridgeEvent`](crate::BridgeEvent)s.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge is disconnected and nothing is queued on its behalf.
    #[error("not connected")]
    NotConnected,

    /// The bridge has been closed and cannot be reused.
    #[error("bridge is closed")]
    Closed,

    #[error("handshake failed: {0}")]
    Handshake(#[source] TransportError),

    #[error("write failed: {0}")]
    WriteFailed(#[source] TransportError),

    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// The connection went away before the frame reached the writer.
    #[error("connection lost")]
    ConnectionLost,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
