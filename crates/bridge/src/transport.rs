// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the orchestrator link.
//!
//! A [`Transport`] dials the orchestrator and hands back the two halves of a
//! live connection. The bridge gives the sink to its single writer task and
//! the stream to its reader task, so neither half is ever shared.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error type for transport operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type TransportResult<T> = Result<T, TransportError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single frame on the link.
///
/// Pings and pongs are the transport's native control frames and carry the
/// heartbeat; application messages always travel as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Write half of a connection.
pub trait FrameSink: Send {
    fn send(&mut self, frame: Frame) -> BoxFuture<'_, TransportResult<()>>;

    /// Closes the write half, flushing anything buffered.
    fn close(&mut self) -> BoxFuture<'_, TransportResult<()>>;
}

/// Read half of a connection.
pub trait FrameStream: Send {
    /// Waits for the next frame. Returns `None` once the peer has closed.
    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<Frame>>>;
}

/// Both halves of a freshly dialed connection.
pub struct Link {
    pub sink: Box<dyn FrameSink>,
    pub stream: Box<dyn FrameStream>,
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link").finish_non_exhaustive()
    }
}

/// Dials the orchestrator.
///
/// Implementations must be cheap to call repeatedly: the bridge dials again
/// on every reconnection attempt.
pub trait Transport: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'_, TransportResult<Link>>;
}

/// WebSocket transport using tokio-tungstenite.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        WebSocketTransport
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WsSink(SplitSink<WsStream, Message>);

struct WsReader(SplitStream<WsStream>);

impl Transport for WebSocketTransport {
    fn connect(&self, url: &str) -> BoxFuture<'_, TransportResult<Link>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let (sink, stream) = ws_stream.split();
            Ok(Link {
                sink: Box::new(WsSink(sink)),
                stream: Box::new(WsReader(stream)),
            })
        })
    }
}

impl FrameSink for WsSink {
    fn send(&mut self, frame: Frame) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            let msg = match frame {
                Frame::Text(text) => Message::Text(text.into()),
                Frame::Ping(payload) => Message::Ping(payload.into()),
                Frame::Pong(payload) => Message::Pong(payload.into()),
                Frame::Close => Message::Close(None),
            };
            self.0
                .send(msg)
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
            // Flush so a dead peer shows up as a failed write
            self.0
                .flush()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }

    fn close(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.0
                .close()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }
}

impl FrameStream for WsReader {
    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<Frame>>> {
        Box::pin(async move {
            loop {
                match self.0.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return Ok(Some(Frame::Text(text.to_string())));
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        return Ok(Some(Frame::Ping(payload.to_vec())));
                    }
                    Some(Ok(Message::Pong(payload))) => {
                        return Ok(Some(Frame::Pong(payload.to_vec())));
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(None),
                    Some(Ok(_)) => {
                        // Binary and raw frames are not part of the protocol
                        continue;
                    }
                    Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
                }
            }
        })
    }
}
