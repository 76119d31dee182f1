// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The single writer of a live connection.
//!
//! One writer task owns the transport sink for the lifetime of a
//! connection. It drains the interrupt lane before normal traffic, bounds
//! every write by the write timeout, and on exit hands back whatever it
//! had not yet written so the bridge can queue it for the next connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use crate::error::BridgeError;
use crate::transport::{Frame, FrameSink};

/// Completion signal for a frame written on behalf of a waiting caller.
pub(crate) type Ack = oneshot::Sender<Result<(), BridgeError>>;

/// Work handed to the writer.
pub(crate) enum Outgoing {
    Text { frame: String, ack: Option<Ack> },
    Ping,
    /// Write the optional notice, close the sink and stop.
    Shutdown {
        notice: Option<String>,
        done: oneshot::Sender<()>,
    },
}

/// A frame the writer took responsibility for but never wrote.
pub(crate) struct Unsent {
    pub frame: String,
    pub ack: Option<Ack>,
}

pub(crate) enum WriterExit {
    /// The connection was cancelled.
    Cancelled { unsent: Vec<Unsent> },
    /// A write failed or timed out.
    Failed { reason: String, unsent: Vec<Unsent> },
    /// Clean shutdown requested by `close`.
    Shutdown,
}

pub(crate) struct Writer {
    pub sink: Box<dyn FrameSink>,
    pub normal: mpsc::Receiver<Outgoing>,
    pub priority: Arc<AsyncMutex<mpsc::Receiver<String>>>,
    pub write_timeout: Duration,
    pub cancel: CancellationToken,
}

impl Writer {
    pub(crate) async fn run(mut self) -> WriterExit {
        // Lane is shared across connections; the previous writer has already exited.
        let priority = Arc::clone(&self.priority);
        let mut priority = tokio::select! {
            _ = self.cancel.cancelled() => {
                return WriterExit::Cancelled { unsent: self.drain() };
            }
            guard = priority.lock() => guard,
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return WriterExit::Cancelled { unsent: self.drain() };
                }
                Some(frame) = priority.recv() => {
                    tracing::debug!("writing interrupt");
                    Outgoing::Text { frame, ack: None }
                }
                msg = self.normal.recv() => match msg {
                    Some(msg) => msg,
                    // every sender is gone: the bridge dropped this connection
                    None => return WriterExit::Cancelled { unsent: Vec::new() },
                },
            };

            match next {
                Outgoing::Text { frame, ack } => {
                    if let Err(e) = self.write(Frame::Text(frame)).await {
                        let reason = e.to_string();
                        if let Some(ack) = ack {
                            let _ = ack.send(Err(e));
                        }
                        return WriterExit::Failed {
                            reason,
                            unsent: self.drain(),
                        };
                    }
                    if let Some(ack) = ack {
                        let _ = ack.send(Ok(()));
                    }
                }
                Outgoing::Ping => {
                    if let Err(e) = self.write(Frame::Ping(Vec::new())).await {
                        return WriterExit::Failed {
                            reason: format!("ping: {}", e),
                            unsent: self.drain(),
                        };
                    }
                }
                Outgoing::Shutdown { notice, done } => {
                    self.shutdown(notice).await;
                    let _ = done.send(());
                    return WriterExit::Shutdown;
                }
            }
        }
    }

    async fn write(&mut self, frame: Frame) -> Result<(), BridgeError> {
        match tokio::time::timeout(self.write_timeout, self.sink.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BridgeError::WriteFailed(e)),
            Err(_) => Err(BridgeError::WriteTimeout(self.write_timeout)),
        }
    }

    async fn shutdown(&mut self, notice: Option<String>) {
        if let Some(notice) = notice {
            if let Err(e) = self.write(Frame::Text(notice)).await {
                tracing::debug!(error = %e, "close notice not delivered");
            }
        }
        match tokio::time::timeout(self.write_timeout, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "close frame not delivered"),
            Err(_) => tracing::debug!("close frame timed out"),
        }
        for unsent in self.drain() {
            if let Some(ack) = unsent.ack {
                let _ = ack.send(Err(BridgeError::Closed));
            }
        }
    }

    /// Closes the normal lane and collects every text frame still in it.
    fn drain(&mut self) -> Vec<Unsent> {
        self.normal.close();
        let mut unsent = Vec::new();
        while let Ok(msg) = self.normal.try_recv() {
            match msg {
                Outgoing::Text { frame, ack } => unsent.push(Unsent { frame, ack }),
                Outgoing::Ping => {}
                Outgoing::Shutdown { done, .. } => {
                    let _ = done.send(());
                }
            }
        }
        unsent
    }
}
