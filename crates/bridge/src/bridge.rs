// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The voice bridge: sole owner of the orchestrator connection.
//!
//! ```text
//!   send / cancel ──► Outbound ──┬─ Connected ────► writer lane ─┐
//!                                ├─ Reconnecting ─► PendingQueue │
//!                                └─ Disconnected ─► NotConnected │
//!   send_interrupt ─► interrupt loop ─► priority lane ───────────┤
//!                                                                ▼
//!                                                           Writer ──► sink
//!   stream ──► Reader ──► InboundRouter ──► listeners, events, fan-out
//!                 └─ pong ─► Liveness ◄── HeartbeatMonitor
//! ```
//!
//! The connection state, reconnect counter, connection generation and the
//! writer handle sit behind one short-lived lock. Every connection gets a
//! child cancellation token, so its reader, writer and heartbeat stop
//! together; the session token stops everything.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vb_core::{
    InterruptNotice, InterruptSignal, Metadata, OutboundMessage, StatusUpdate, Transcript,
};

use crate::config::BridgeConfig;
use crate::dispatch::{Outgoing, Unsent, Writer, WriterExit};
use crate::error::{BridgeError, Result};
use crate::events::{BridgeEvent, EVENT_CAPACITY};
use crate::fanout::{ClientFanout, PassthroughSink, SinkId};
use crate::heartbeat::{HeartbeatExit, HeartbeatMonitor, Liveness};
use crate::listeners::ListenerRegistry;
use crate::queue::PendingQueue;
use crate::router::InboundRouter;
use crate::state::ConnectionState;
use crate::transport::{Frame, FrameStream, Link, Transport, TransportError, WebSocketTransport};

/// Room in a connection's writer lane beyond the flushed backlog.
const SEND_BUFFER: usize = 100;

/// Client for the voice orchestrator that survives connection loss.
///
/// Dropping the bridge cancels its background tasks; [`close`](Self::close)
/// additionally says goodbye to the orchestrator.
pub struct VoiceBridge<T: Transport = WebSocketTransport> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    config: BridgeConfig,
    transport: T,
    link: Mutex<LinkState>,
    /// Locked after `link` when both are needed.
    pending: Mutex<PendingQueue>,
    listeners: Arc<ListenerRegistry>,
    fanout: Arc<ClientFanout>,
    router: InboundRouter,
    events: broadcast::Sender<BridgeEvent>,
    cancel: CancellationToken,
    interrupt_tx: mpsc::Sender<InterruptSignal>,
    interrupt_rx: Mutex<Option<mpsc::Receiver<InterruptSignal>>>,
    priority_tx: mpsc::Sender<String>,
    priority_rx: Arc<AsyncMutex<mpsc::Receiver<String>>>,
}

struct LinkState {
    state: ConnectionState,
    /// Reconnection attempts since the last successful connection.
    attempt: u32,
    /// Bumped on every established connection.
    generation: u64,
    writer: Option<mpsc::Sender<Outgoing>>,
    writer_task: Option<JoinHandle<()>>,
    conn_cancel: Option<CancellationToken>,
    closed: bool,
}

/// Whether a frame may wait in the pending queue while the link is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Queueable,
    ConnectedOnly,
}

impl VoiceBridge<WebSocketTransport> {
    /// Creates a bridge that dials the orchestrator over WebSocket.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        Self::with_transport(config, WebSocketTransport::new())
    }
}

impl<T: Transport> VoiceBridge<T> {
    /// Creates a bridge over a custom transport. Does not connect.
    pub fn with_transport(config: BridgeConfig, transport: T) -> Result<Self> {
        config.validate()?;

        let listeners = Arc::new(ListenerRegistry::new());
        let fanout = Arc::new(ClientFanout::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let router =
            InboundRouter::new(Arc::clone(&listeners), Arc::clone(&fanout), events.clone());
        let (interrupt_tx, interrupt_rx) = mpsc::channel(config.interrupt_capacity);
        let (priority_tx, priority_rx) = mpsc::channel(config.interrupt_capacity);

        let shared = Shared {
            pending: Mutex::new(PendingQueue::new(config.max_pending_messages)),
            link: Mutex::new(LinkState {
                state: ConnectionState::Disconnected,
                attempt: 0,
                generation: 0,
                writer: None,
                writer_task: None,
                conn_cancel: None,
                closed: false,
            }),
            config,
            transport,
            listeners,
            fanout,
            router,
            events,
            cancel: CancellationToken::new(),
            interrupt_tx,
            interrupt_rx: Mutex::new(Some(interrupt_rx)),
            priority_tx,
            priority_rx: Arc::new(AsyncMutex::new(priority_rx)),
        };
        Ok(VoiceBridge {
            shared: Arc::new(shared),
        })
    }

    /// Connects to the orchestrator.
    ///
    /// A no-op while connected or while a connection is being made. A
    /// failed handshake returns the bridge to `Disconnected` and is not
    /// retried.
    pub async fn connect(&self) -> Result<()> {
        Arc::clone(&self.shared).connect().await
    }

    /// Shuts down: sends the close notice, stops every background task and
    /// detaches all passthrough sinks. The bridge cannot be reused.
    pub async fn close(&self) {
        self.shared.close().await
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.link.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn is_closed(&self) -> bool {
        self.shared.link.lock().closed
    }

    pub fn url(&self) -> &str {
        &self.shared.config.url
    }

    pub fn session_id(&self) -> &str {
        &self.shared.config.session_id
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// Frames waiting for the next connection.
    pub fn pending_len(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Reconnection attempts since the last successful connection.
    pub fn reconnect_attempt(&self) -> u32 {
        self.shared.link.lock().attempt
    }

    /// Subscribes to connection and message events.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.shared.events.subscribe()
    }

    /// Asks the orchestrator to speak `text`.
    ///
    /// Succeeds once written while connected, or once queued while
    /// reconnecting. Fails with [`BridgeError::NotConnected`] when
    /// disconnected.
    pub async fn send(&self, text: impl Into<String>) -> Result<()> {
        self.shared
            .dispatch(OutboundMessage::synthesize(text), Delivery::Queueable)
            .await
    }

    /// Alias of [`send`](Self::send).
    pub async fn speak(&self, text: impl Into<String>) -> Result<()> {
        self.send(text).await
    }

    /// Stops current playback. Queued like `send` while reconnecting.
    pub async fn cancel(&self) -> Result<()> {
        self.shared
            .dispatch(OutboundMessage::Cancel, Delivery::Queueable)
            .await
    }

    /// Alias of [`cancel`](Self::cancel).
    pub async fn stop_speaking(&self) -> Result<()> {
        self.cancel().await
    }

    /// Plays pre-rendered audio. Requires a live connection.
    pub async fn send_audio(&self, audio: &[u8], format: &str) -> Result<()> {
        self.shared
            .dispatch(OutboundMessage::play_audio(audio, format), Delivery::ConnectedOnly)
            .await
    }

    /// Updates pipeline settings. Requires a live connection.
    pub async fn send_config(&self, settings: Metadata) -> Result<()> {
        self.shared
            .dispatch(OutboundMessage::Config(settings), Delivery::ConnectedOnly)
            .await
    }

    pub async fn start_listening(&self) -> Result<()> {
        self.send_config(mode("listening")).await
    }

    pub async fn stop_listening(&self) -> Result<()> {
        self.send_config(mode("idle")).await
    }

    /// Relays a raw frame from an attached local client upstream.
    pub async fn forward(&self, raw: &str) -> Result<()> {
        let result = self
            .shared
            .submit(raw.to_string(), "passthrough", Delivery::ConnectedOnly)
            .await;
        if let Err(BridgeError::NotConnected) = result {
            tracing::debug!("not connected, dropping client frame");
        }
        result
    }

    /// Hands an interrupt to the priority path.
    ///
    /// Never waits: returns false if the interrupt channel is full (the new
    /// interrupt is dropped) or the bridge is closed.
    pub fn send_interrupt(&self, signal: InterruptSignal) -> bool {
        self.shared.send_interrupt(signal)
    }

    pub fn on_transcript<F>(&self, handler: F)
    where
        F: Fn(&Transcript) + Send + Sync + 'static,
    {
        self.shared.listeners.transcript.add(handler);
    }

    pub fn on_interrupt<F>(&self, handler: F)
    where
        F: Fn(&InterruptNotice) + Send + Sync + 'static,
    {
        self.shared.listeners.interrupt.add(handler);
    }

    pub fn on_status<F>(&self, handler: F)
    where
        F: Fn(&StatusUpdate) + Send + Sync + 'static,
    {
        self.shared.listeners.status.add(handler);
    }

    /// Attaches a sink that receives every parsed inbound frame verbatim.
    pub fn attach(&self, sink: Arc<dyn PassthroughSink>) -> SinkId {
        self.shared.fanout.attach(sink)
    }

    pub fn detach(&self, id: SinkId) -> bool {
        self.shared.fanout.detach(id)
    }
}

impl<T: Transport> Drop for VoiceBridge<T> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl<T: Transport> std::fmt::Debug for VoiceBridge<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceBridge")
            .field("url", &self.shared.config.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn mode(value: &str) -> Metadata {
    let mut settings = Metadata::new();
    settings.insert("mode".to_string(), value.into());
    settings
}

impl<T: Transport> Shared<T> {
    fn emit(&self, event: BridgeEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Moves to `to`, publishing the change while the lock is still held so
    /// subscribers observe transitions in order.
    fn transition(&self, link: &mut LinkState, to: ConnectionState) {
        let from = link.state;
        if from == to {
            return;
        }
        debug_assert!(from.permits(to), "illegal transition {} -> {}", from, to);
        link.state = to;
        tracing::info!(%from, %to, "state changed");
        self.emit(BridgeEvent::StateChanged { from, to });
    }

    async fn connect(self: Arc<Self>) -> Result<()> {
        {
            let mut link = self.link.lock();
            if link.closed {
                return Err(BridgeError::Closed);
            }
            if link.state != ConnectionState::Disconnected {
                return Ok(());
            }
            link.attempt = 0;
            self.transition(&mut link, ConnectionState::Connecting);
        }
        self.ensure_interrupt_loop();

        tracing::info!(url = %self.config.url, "connecting to orchestrator");
        match self.dial().await {
            Ok(conn) => {
                if self.establish(conn, ConnectionState::Connecting) {
                    Ok(())
                } else {
                    Err(BridgeError::Closed)
                }
            }
            Err(e) => {
                let mut link = self.link.lock();
                if link.state == ConnectionState::Connecting {
                    self.transition(&mut link, ConnectionState::Disconnected);
                }
                drop(link);
                tracing::warn!(error = %e, "connect failed");
                Err(BridgeError::Handshake(e))
            }
        }
    }

    async fn dial(&self) -> std::result::Result<Link, TransportError> {
        let handshake = self.config.handshake_timeout;
        tokio::select! {
            _ = self.cancel.cancelled() => Err(TransportError::ConnectionClosed),
            result = tokio::time::timeout(handshake, self.transport.connect(&self.config.url)) => {
                result.unwrap_or(Err(TransportError::Timeout(handshake)))
            }
        }
    }

    /// Installs a freshly dialed connection if the bridge is still in
    /// `expected`. Flushes the pending queue into the new writer lane and
    /// starts the per-connection tasks.
    fn establish(self: &Arc<Self>, conn: Link, expected: ConnectionState) -> bool {
        let mut link = self.link.lock();
        if link.closed || link.state != expected {
            return false;
        }

        link.generation += 1;
        let generation = link.generation;
        link.attempt = 0;

        let (writer_tx, writer_rx) =
            mpsc::channel(self.config.max_pending_messages + SEND_BUFFER);
        let flushed = {
            let mut pending = self.pending.lock();
            let frames = pending.drain();
            let count = frames.len();
            for frame in frames {
                // lane capacity exceeds the queue capacity
                let _ = writer_tx.try_send(Outgoing::Text { frame, ack: None });
            }
            count
        };

        let conn_cancel = self.cancel.child_token();
        let liveness = Arc::new(Liveness::new());
        let Link { sink, stream } = conn;

        let writer = Writer {
            sink,
            normal: writer_rx,
            priority: Arc::clone(&self.priority_rx),
            write_timeout: self.config.write_timeout,
            cancel: conn_cancel.clone(),
        };
        link.writer_task = Some(tokio::spawn(Arc::clone(self).run_writer(generation, writer)));
        tokio::spawn(Arc::clone(self).run_reader(
            generation,
            stream,
            Arc::clone(&liveness),
            conn_cancel.clone(),
        ));
        tokio::spawn(Arc::clone(self).run_heartbeat(
            generation,
            liveness,
            writer_tx.clone(),
            conn_cancel.clone(),
        ));

        link.writer = Some(writer_tx);
        link.conn_cancel = Some(conn_cancel);
        self.transition(&mut link, ConnectionState::Connected);
        self.emit(BridgeEvent::Connected {
            url: self.config.url.clone(),
        });
        drop(link);

        tracing::info!(url = %self.config.url, generation, flushed, "connected");
        true
    }

    /// Reacts to the first failure of connection `generation`. Later
    /// reports for the same connection are ignored.
    fn connection_lost(self: &Arc<Self>, generation: u64, reason: String) {
        let mut link = self.link.lock();
        if link.closed
            || link.generation != generation
            || link.state != ConnectionState::Connected
        {
            return;
        }

        link.writer = None;
        if let Some(cancel) = link.conn_cancel.take() {
            cancel.cancel();
        }
        let writer_task = link.writer_task.take();
        self.transition(&mut link, ConnectionState::Reconnecting);
        self.emit(BridgeEvent::Disconnected {
            reason: reason.clone(),
        });
        drop(link);

        tracing::warn!(%reason, generation, "connection lost");
        tokio::spawn(Arc::clone(self).reconnect(writer_task));
    }

    async fn reconnect(self: Arc<Self>, old_writer: Option<JoinHandle<()>>) {
        // unsent frames of the old writer go back into the queue first
        if let Some(handle) = old_writer {
            let _ = handle.await;
        }

        let backoff = self.config.backoff();
        loop {
            let (attempt, delay) = {
                let mut link = self.link.lock();
                if link.closed || link.state != ConnectionState::Reconnecting {
                    return;
                }
                let max = self.config.max_reconnects;
                if max > 0 && link.attempt >= max {
                    let attempts = link.attempt;
                    self.transition(&mut link, ConnectionState::Disconnected);
                    let message = format!("gave up after {} reconnection attempts", attempts);
                    self.emit(BridgeEvent::Fatal {
                        attempts,
                        message: message.clone(),
                    });
                    drop(link);
                    tracing::error!(attempts, url = %self.config.url, "{}", message);
                    return;
                }
                link.attempt += 1;
                (link.attempt, backoff.delay(link.attempt))
            };

            tracing::info!(attempt, ?delay, "reconnecting");
            self.emit(BridgeEvent::Reconnecting { attempt, delay });

            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.dial().await {
                Ok(conn) => {
                    self.establish(conn, ConnectionState::Reconnecting);
                    return;
                }
                Err(e) => tracing::warn!(attempt, error = %e, "reconnection attempt failed"),
            }
        }
    }

    async fn run_writer(self: Arc<Self>, generation: u64, writer: Writer) {
        match writer.run().await {
            WriterExit::Cancelled { unsent } => self.requeue(unsent),
            WriterExit::Failed { reason, unsent } => {
                self.requeue(unsent);
                self.connection_lost(generation, reason);
            }
            WriterExit::Shutdown => {}
        }
    }

    async fn run_reader(
        self: Arc<Self>,
        generation: u64,
        mut stream: Box<dyn FrameStream>,
        liveness: Arc<Liveness>,
        cancel: CancellationToken,
    ) {
        let read_timeout = self.config.read_timeout;
        let reason = loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return,
                next = tokio::time::timeout(read_timeout, stream.recv()) => next,
            };
            match next {
                Ok(Ok(Some(Frame::Text(raw)))) => {
                    // parse errors are logged by the router
                    let _ = self.router.route(&raw);
                }
                Ok(Ok(Some(Frame::Pong(_)))) => {
                    tracing::debug!("pong received");
                    liveness.touch();
                }
                Ok(Ok(Some(Frame::Ping(_)))) => {}
                Ok(Ok(Some(Frame::Close))) | Ok(Ok(None)) => {
                    break "closed by orchestrator".to_string();
                }
                Ok(Err(e)) => break e.to_string(),
                Err(_) => break format!("no frame for {:?}", read_timeout),
            }
        };
        self.connection_lost(generation, reason);
    }

    async fn run_heartbeat(
        self: Arc<Self>,
        generation: u64,
        liveness: Arc<Liveness>,
        writer: mpsc::Sender<Outgoing>,
        cancel: CancellationToken,
    ) {
        let monitor =
            HeartbeatMonitor::new(self.config.heartbeat_interval, self.config.heartbeat_timeout);
        let exit = monitor
            .run(&liveness, &cancel, || match writer.try_send(Outgoing::Ping) {
                // a busy writer is not a dead link; staleness decides
                Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            })
            .await;
        match exit {
            HeartbeatExit::Cancelled => {}
            HeartbeatExit::Stale { silent_for } => {
                self.connection_lost(generation, format!("no pong for {:?}", silent_for));
            }
            HeartbeatExit::ProbeFailed => {
                self.connection_lost(generation, "writer stopped".to_string());
            }
        }
    }

    /// Puts frames a writer never wrote back at the head of the queue.
    fn requeue(&self, unsent: Vec<Unsent>) {
        if unsent.is_empty() {
            return;
        }
        let link = self.link.lock();
        if link.closed {
            drop(link);
            for frame in unsent {
                if let Some(ack) = frame.ack {
                    let _ = ack.send(Err(BridgeError::Closed));
                }
            }
            return;
        }

        let mut frames = Vec::with_capacity(unsent.len());
        let mut acks = Vec::new();
        for item in unsent {
            frames.push(item.frame);
            acks.extend(item.ack);
        }
        let count = frames.len();
        let dropped = self.pending.lock().restore(frames);
        drop(link);

        tracing::info!(count, dropped, "requeued unsent frames");
        // accepted for delivery on the next connection
        for ack in acks {
            let _ = ack.send(Ok(()));
        }
    }

    fn enqueue(&self, frame: String, kind: &str) {
        let mut pending = self.pending.lock();
        if let Some(evicted) = pending.push(frame) {
            tracing::warn!(
                kind,
                capacity = pending.capacity(),
                evicted_len = evicted.len(),
                "pending queue full, dropped oldest frame"
            );
        } else {
            tracing::debug!(kind, queued = pending.len(), "queued frame while reconnecting");
        }
    }

    async fn dispatch(self: &Arc<Self>, msg: OutboundMessage, delivery: Delivery) -> Result<()> {
        let frame = msg.encode(&self.config.session_id)?;
        self.submit(frame, msg.kind(), delivery).await
    }

    /// Routes one serialized frame by connection state.
    async fn submit(self: &Arc<Self>, frame: String, kind: &str, delivery: Delivery) -> Result<()> {
        let writer = {
            let link = self.link.lock();
            if link.closed {
                return Err(BridgeError::Closed);
            }
            match (link.state, delivery) {
                (ConnectionState::Connected, _) => link.writer.clone(),
                (ConnectionState::Reconnecting, Delivery::Queueable)
                | (ConnectionState::Connecting, Delivery::Queueable) => {
                    self.enqueue(frame, kind);
                    return Ok(());
                }
                (ConnectionState::Disconnected, Delivery::Queueable) => {
                    drop(link);
                    if self.config.connect_on_send {
                        tracing::info!("send while disconnected, starting connect");
                        let shared = Arc::clone(self);
                        tokio::spawn(async move {
                            if let Err(e) = shared.connect().await {
                                tracing::warn!(error = %e, "background connect failed");
                            }
                        });
                    }
                    return Err(BridgeError::NotConnected);
                }
                _ => return Err(BridgeError::NotConnected),
            }
        };
        let Some(writer) = writer else {
            return Err(BridgeError::NotConnected);
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        let outgoing = Outgoing::Text {
            frame,
            ack: Some(ack_tx),
        };
        match writer.send(outgoing).await {
            Ok(()) => {}
            Err(mpsc::error::SendError(Outgoing::Text { frame, .. })) => {
                // writer went away between the state check and the send
                return self.retry_after_loss(frame, kind, delivery);
            }
            Err(_) => return Err(BridgeError::ConnectionLost),
        }

        tracing::debug!(kind, "frame handed to writer");
        tokio::select! {
            ack = ack_rx => ack.unwrap_or(Err(BridgeError::ConnectionLost)),
            _ = self.cancel.cancelled() => Err(BridgeError::Closed),
        }
    }

    fn retry_after_loss(&self, frame: String, kind: &str, delivery: Delivery) -> Result<()> {
        let link = self.link.lock();
        if link.closed {
            return Err(BridgeError::Closed);
        }
        if delivery == Delivery::Queueable && link.state == ConnectionState::Reconnecting {
            self.enqueue(frame, kind);
            return Ok(());
        }
        Err(BridgeError::ConnectionLost)
    }

    fn send_interrupt(&self, signal: InterruptSignal) -> bool {
        if self.link.lock().closed {
            return false;
        }
        match self.interrupt_tx.try_send(signal) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(signal)) => {
                tracing::warn!(kind = %signal.kind, "interrupt channel full, dropping interrupt");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Starts the session-wide interrupt loop on first use.
    fn ensure_interrupt_loop(self: &Arc<Self>) {
        let Some(rx) = self.interrupt_rx.lock().take() else {
            return;
        };
        tokio::spawn(Arc::clone(self).run_interrupts(rx));
    }

    async fn run_interrupts(self: Arc<Self>, mut rx: mpsc::Receiver<InterruptSignal>) {
        loop {
            let signal = tokio::select! {
                _ = self.cancel.cancelled() => return,
                signal = rx.recv() => match signal {
                    Some(signal) => signal,
                    None => return,
                },
            };

            let encoded =
                OutboundMessage::Interrupt(signal.clone()).encode(&self.config.session_id);
            let frame = match encoded {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode interrupt");
                    continue;
                }
            };
            match self.priority_tx.try_send(frame) {
                Ok(()) => {
                    tracing::info!(kind = %signal.kind, reason = %signal.reason, "interrupt sent");
                    self.emit(BridgeEvent::InterruptSent(signal));
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(kind = %signal.kind, "priority lane full, dropping interrupt");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
        }
    }

    async fn close(&self) {
        let writer = {
            let mut link = self.link.lock();
            if link.closed {
                return;
            }
            link.closed = true;
            link.writer_task = None;
            self.transition(&mut link, ConnectionState::Disconnected);
            link.writer.take()
        };

        if let Some(writer) = writer {
            let notice = match OutboundMessage::CloseStream.encode(&self.config.session_id) {
                Ok(notice) => Some(notice),
                Err(e) => {
                    tracing::debug!(error = %e, "failed to encode close notice");
                    None
                }
            };
            let (done_tx, done_rx) = oneshot::channel();
            let shutdown = async {
                if writer
                    .send(Outgoing::Shutdown {
                        notice,
                        done: done_tx,
                    })
                    .await
                    .is_ok()
                {
                    let _ = done_rx.await;
                }
            };
            if tokio::time::timeout(self.config.write_timeout, shutdown).await.is_err() {
                tracing::warn!("clean shutdown timed out");
            }
        }

        self.cancel.cancel();
        self.fanout.close_all();
        let discarded = self.pending.lock().drain().len();
        if discarded > 0 {
            tracing::warn!(discarded, "discarded queued frames on close");
        }
        tracing::info!(url = %self.config.url, "voice bridge closed");
    }
}

impl std::fmt::Debug for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkState")
            .field("state", &self.state)
            .field("attempt", &self.attempt)
            .field("generation", &self.generation)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
