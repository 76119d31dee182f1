// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for wire schema operations.

use thiserror::Error;

/// Errors raised while encoding or decoding orchestrator frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown message type: '{0}'")]
    UnknownType(String),

    #[error("missing field '{field}' for '{kind}' message")]
    MissingField { kind: String, field: &'static str },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// A specialized Result type for wire schema operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
