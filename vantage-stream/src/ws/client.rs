//! Streaming client with automatic reconnection.
//!
//! [`StreamClient`] is a cheap-to-clone handle shared by every UI component
//! that consumes the feed. All connection state lives in a single supervisor
//! task; public operations post commands to it and return immediately, so
//! there is never more than one live transport session or more than one
//! pending reconnect timer per client. The supervisor ends when the last
//! handle is dropped.

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use vantage_core::error::NetworkError;
use vantage_core::types::{EventCategory, Symbol};

use crate::dispatch::{ConsumerHandle, MessageDispatcher};
use crate::registry::SubscriptionRegistry;

use super::config::StreamConfig;
use super::frame::{
    AlertEvent, BotStatusEvent, ControlFrame, EventMessage, FrameCodec, QuoteUpdate, SignalEvent,
    WarningEvent,
};
use super::message::TransportMessage;
use super::state::{ConnectionState, InternalState};
use super::transport::{
    endpoint_url, TokenProvider, Transport, TransportSink, TransportSource, WsTransport,
};

/// Consumer of connection status transitions.
type StatusConsumer = Arc<dyn Fn(ConnectionState) + Send + Sync>;

/// Handle for a registered status observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusHandle(u64);

#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    Subscribe(Symbol),
    Unsubscribe(Symbol),
}

enum SessionEnd {
    /// Caller asked for the teardown; do not reconnect.
    Manual,
    /// Every client handle was dropped; the supervisor should exit.
    Shutdown,
    /// The transport ended on its own (clean close or error).
    Dropped { error: Option<NetworkError> },
}

struct Shared {
    config: StreamConfig,
    state: RwLock<InternalState>,
    registry: SubscriptionRegistry,
    dispatcher: MessageDispatcher,
    status_consumers: RwLock<Vec<(u64, StatusConsumer)>>,
    next_status_id: AtomicU64,
}

impl Shared {
    fn transition(&self, next: ConnectionState) {
        {
            let mut state = self.state.write();
            if state.state == next {
                return;
            }
            match next {
                ConnectionState::Connected => state.mark_connected(),
                ConnectionState::Connecting => state.mark_connecting(),
                ConnectionState::Disconnected => state.mark_disconnected(),
                ConnectionState::Error => state.mark_error("transport error"),
            }
        }
        debug!(status = %next, "Connection status changed");
        self.notify_status(next);
    }

    fn transition_error(&self, reason: &str) {
        {
            let mut state = self.state.write();
            if state.state == ConnectionState::Error {
                return;
            }
            state.mark_error(reason);
        }
        debug!(status = %ConnectionState::Error, error = reason, "Connection status changed");
        self.notify_status(ConnectionState::Error);
    }

    fn notify_status(&self, status: ConnectionState) {
        let snapshot: Vec<StatusConsumer> = self
            .status_consumers
            .read()
            .iter()
            .map(|(_, consumer)| Arc::clone(consumer))
            .collect();
        for consumer in snapshot {
            if catch_unwind(AssertUnwindSafe(|| consumer(status))).is_err() {
                error!(status = %status, "Status observer panicked");
            }
        }
    }
}

/// Handle to the streaming client.
///
/// Clones share the same session, registry, and dispatcher; the intended
/// use is one client per application, cloned into each consuming component.
///
/// Must be created inside a Tokio runtime: construction spawns the
/// supervisor task that owns the connection.
///
/// # Example
///
/// ```ignore
/// use vantage_stream::ws::{StreamClient, StreamConfig};
/// use vantage_core::types::Symbol;
///
/// let config = StreamConfig::builder()
///     .url("wss://api.vantage.app/stream")
///     .auto_connect(true)
///     .build();
/// let client = StreamClient::new(config);
///
/// let aapl = Symbol::new("AAPL")?;
/// let _watch = client.on_quote(aapl.clone(), |quote| println!("{quote:?}"));
/// client.subscribe(aapl);
/// ```
#[derive(Clone)]
pub struct StreamClient {
    shared: Arc<Shared>,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

/// Builder for [`StreamClient`] with a custom transport or token source.
pub struct StreamClientBuilder {
    config: StreamConfig,
    transport: Option<Arc<dyn Transport>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl StreamClientBuilder {
    /// Replaces the production WebSocket transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the provider consulted for an auth token at each connect.
    #[must_use]
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Builds the client and spawns its supervisor task.
    #[must_use]
    pub fn build(self) -> StreamClient {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            config: self.config,
            state: RwLock::new(InternalState::new()),
            registry: SubscriptionRegistry::new(),
            dispatcher: MessageDispatcher::new(),
            status_consumers: RwLock::new(Vec::new()),
            next_status_id: AtomicU64::new(0),
        });

        let supervisor = Supervisor {
            shared: Arc::clone(&shared),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(WsTransport::new())),
            token_provider: self.token_provider,
            cmd_rx,
            codec: FrameCodec::new(),
        };
        tokio::spawn(supervisor.run());

        StreamClient { shared, cmd_tx }
    }
}

impl StreamClient {
    /// Creates a client with the production WebSocket transport.
    #[must_use]
    pub fn new(config: StreamConfig) -> Self {
        Self::builder(config).build()
    }

    /// Returns a builder for injecting a transport or token provider.
    #[must_use]
    pub fn builder(config: StreamConfig) -> StreamClientBuilder {
        StreamClientBuilder {
            config,
            transport: None,
            token_provider: None,
        }
    }

    /// Returns the current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionState {
        self.shared.state.read().state
    }

    /// Returns the number of reconnect attempts since the last successful
    /// connection.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.state.read().reconnect_attempts
    }

    /// Returns the most recent transport error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.shared.state.read().last_error.clone()
    }

    /// Requests a connection. No-op if already connecting or connected.
    ///
    /// Returns immediately; observe the outcome through
    /// [`status`](Self::status) or [`on_status`](Self::on_status).
    pub fn connect(&self) {
        let _ = self.cmd_tx.send(Command::Connect);
    }

    /// Tears the connection down and cancels any pending reconnect.
    ///
    /// Registry entries stay intact, so a later [`connect`](Self::connect)
    /// resumes the same topic set.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }

    /// Registers interest in a symbol's quote stream.
    ///
    /// Ref-counted: each call adds one consumer's interest. When connected,
    /// a subscribe frame goes out for any symbol not yet subscribed on the
    /// current connection; otherwise the symbol is replayed on the next
    /// connection.
    pub fn subscribe(&self, symbol: Symbol) {
        if self.shared.registry.subscribe(&symbol) {
            let _ = self.cmd_tx.send(Command::Subscribe(symbol));
        }
    }

    /// Withdraws one consumer's interest in a symbol.
    ///
    /// The unsubscribe frame is only sent once the last interested consumer
    /// is gone. Unsubscribing an unknown symbol is a no-op.
    pub fn unsubscribe(&self, symbol: Symbol) {
        if self.shared.registry.unsubscribe(&symbol) {
            let _ = self.cmd_tx.send(Command::Unsubscribe(symbol));
        }
    }

    /// Returns the currently subscribed symbols.
    #[must_use]
    pub fn subscribed_symbols(&self) -> Vec<Symbol> {
        self.shared.registry.symbols()
    }

    /// Returns the message dispatcher for direct consumer registration.
    #[must_use]
    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.shared.dispatcher
    }

    /// Registers a consumer for every quote of `symbol`.
    pub fn on_quote(
        &self,
        symbol: Symbol,
        consumer: impl Fn(&QuoteUpdate) + Send + Sync + 'static,
    ) -> ConsumerHandle {
        self.shared.dispatcher.on_quote(symbol, consumer)
    }

    /// Registers a consumer for new-signal events.
    pub fn on_new_signal(
        &self,
        consumer: impl Fn(&SignalEvent) + Send + Sync + 'static,
    ) -> ConsumerHandle {
        self.shared
            .dispatcher
            .on_event(EventCategory::NewSignal, move |event| {
                if let EventMessage::NewSignal(signal) = event {
                    consumer(signal);
                }
            })
    }

    /// Registers a consumer for position-alert events.
    pub fn on_position_alert(
        &self,
        consumer: impl Fn(&AlertEvent) + Send + Sync + 'static,
    ) -> ConsumerHandle {
        self.shared
            .dispatcher
            .on_event(EventCategory::PositionAlert, move |event| {
                if let EventMessage::PositionAlert(alert) = event {
                    consumer(alert);
                }
            })
    }

    /// Registers a consumer for risk-warning events.
    pub fn on_risk_warning(
        &self,
        consumer: impl Fn(&WarningEvent) + Send + Sync + 'static,
    ) -> ConsumerHandle {
        self.shared
            .dispatcher
            .on_event(EventCategory::RiskWarning, move |event| {
                if let EventMessage::RiskWarning(warning) = event {
                    consumer(warning);
                }
            })
    }

    /// Registers a consumer for bot-status events.
    pub fn on_bot_status(
        &self,
        consumer: impl Fn(&BotStatusEvent) + Send + Sync + 'static,
    ) -> ConsumerHandle {
        self.shared
            .dispatcher
            .on_event(EventCategory::BotStatus, move |event| {
                if let EventMessage::BotStatus(status) = event {
                    consumer(status);
                }
            })
    }

    /// Removes a previously registered message consumer. Idempotent.
    pub fn remove_consumer(&self, handle: &ConsumerHandle) {
        self.shared.dispatcher.remove(handle);
    }

    /// Registers an observer invoked on every connection status transition.
    pub fn on_status(
        &self,
        consumer: impl Fn(ConnectionState) + Send + Sync + 'static,
    ) -> StatusHandle {
        let id = self.shared.next_status_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .status_consumers
            .write()
            .push((id, Arc::new(consumer)));
        StatusHandle(id)
    }

    /// Removes a status observer. Idempotent.
    pub fn remove_status_observer(&self, handle: StatusHandle) {
        self.shared
            .status_consumers
            .write()
            .retain(|(id, _)| *id != handle.0);
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("status", &self.status())
            .field("subscriptions", &self.shared.registry.len())
            .finish()
    }
}

struct Supervisor {
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    codec: FrameCodec,
}

impl Supervisor {
    async fn run(mut self) {
        let mut want_connected = self.shared.config.auto_connect;

        loop {
            if !want_connected {
                match self.cmd_rx.recv().await {
                    Some(Command::Connect) => {
                        self.shared.state.write().reconnect_attempts = 0;
                        want_connected = true;
                    }
                    Some(Command::Disconnect) => {}
                    Some(Command::Subscribe(symbol)) => {
                        debug!(symbol = %symbol, "Not connected; subscription will replay on connect");
                    }
                    Some(Command::Unsubscribe(symbol)) => {
                        debug!(symbol = %symbol, "Not connected; unsubscribe dropped");
                    }
                    None => return,
                }
                continue;
            }

            // Backoff before a retry; the first attempt connects immediately.
            // A single pending timer, cancelled atomically by Disconnect.
            let attempt = self.shared.state.read().reconnect_attempts;
            if attempt > 0 {
                let delay = self.shared.config.reconnect_delay_for(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
                let sleep = tokio::time::sleep(delay);
                tokio::pin!(sleep);
                let mut cancelled = false;
                loop {
                    tokio::select! {
                        biased;
                        cmd = self.cmd_rx.recv() => match cmd {
                            Some(Command::Disconnect) => {
                                info!("Pending reconnect cancelled");
                                cancelled = true;
                                break;
                            }
                            // An explicit connect skips the remaining wait
                            Some(Command::Connect) => {
                                self.shared.state.write().reconnect_attempts = 0;
                                break;
                            }
                            // The registry replay covers these on connect
                            Some(Command::Subscribe(_) | Command::Unsubscribe(_)) => {}
                            None => return,
                        },
                        () = &mut sleep => break,
                    }
                }
                if cancelled {
                    want_connected = false;
                    continue;
                }
            }

            self.shared.transition(ConnectionState::Connecting);
            let token = self.token_provider.as_ref().and_then(|p| p.token());
            let url = endpoint_url(&self.shared.config.url, token.as_deref());

            let connected = match timeout(
                self.shared.config.connect_timeout(),
                self.transport.connect(&url),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(NetworkError::Timeout {
                    timeout_ms: self.shared.config.connect_timeout_ms,
                }),
            };

            match connected {
                Ok((mut sink, source)) => {
                    info!(url = %self.shared.config.url, "Stream connected");
                    self.shared.transition(ConnectionState::Connected);
                    self.replay_subscriptions(sink.as_mut()).await;

                    match self.run_session(sink, source).await {
                        SessionEnd::Manual => {
                            info!("Stream disconnected by caller");
                            self.shared.transition(ConnectionState::Disconnected);
                            want_connected = false;
                        }
                        SessionEnd::Shutdown => return,
                        SessionEnd::Dropped { error } => {
                            if let Some(e) = &error {
                                self.shared.transition_error(&e.to_string());
                            }
                            self.shared.transition(ConnectionState::Disconnected);
                            want_connected = self.after_drop();
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Stream connection failed");
                    self.shared.transition_error(&e.to_string());
                    self.shared.transition(ConnectionState::Disconnected);
                    want_connected = self.after_drop();
                }
            }
        }
    }

    /// Records a reconnect attempt after an unexpected drop; returns whether
    /// the supervisor should keep trying.
    fn after_drop(&self) -> bool {
        if self.shared.config.reconnect_enabled {
            self.shared.state.write().record_attempt();
            true
        } else {
            false
        }
    }

    /// Resends subscribe frames for the registry's full topic set.
    ///
    /// Runs before the session loop reads any inbound frame, so the replay
    /// happens-before dispatch of any message on the new connection.
    async fn replay_subscriptions(&self, sink: &mut dyn TransportSink) {
        for symbol in self.shared.registry.begin_session() {
            if self
                .send_control(sink, ControlFrame::subscribe(symbol.clone()))
                .await
            {
                self.shared.registry.mark_confirmed(&symbol);
                debug!(symbol = %symbol, "Replayed subscription");
            }
        }
    }

    /// Encodes and sends one control frame; returns whether it went out.
    async fn send_control(&self, sink: &mut dyn TransportSink, frame: ControlFrame) -> bool {
        let json = match self.codec.encode(&frame) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to encode control frame");
                return false;
            }
        };
        match sink.send(TransportMessage::Text(json)).await {
            Ok(()) => true,
            Err(e) => {
                // The session is about to die; the replay on the next
                // connection re-establishes the registry's set.
                warn!(error = %e, symbol = %frame.symbol(), "Failed to send control frame");
                false
            }
        }
    }

    async fn run_session(
        &mut self,
        mut sink: Box<dyn TransportSink>,
        mut source: Box<dyn TransportSource>,
    ) -> SessionEnd {
        let mut heartbeat = tokio::time::interval(self.shared.config.heartbeat_interval());
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Disconnect) => {
                        let _ = sink.close().await;
                        return SessionEnd::Manual;
                    }
                    Some(Command::Connect) => {}
                    Some(Command::Subscribe(symbol)) => {
                        // The session task is the single writer of `confirmed`,
                        // so each topic is subscribed at most once per connection.
                        if self.shared.registry.needs_frame(&symbol)
                            && self
                                .send_control(sink.as_mut(), ControlFrame::subscribe(symbol.clone()))
                                .await
                        {
                            self.shared.registry.mark_confirmed(&symbol);
                        }
                    }
                    Some(Command::Unsubscribe(symbol)) => {
                        let _ = self
                            .send_control(sink.as_mut(), ControlFrame::unsubscribe(symbol))
                            .await;
                    }
                    None => {
                        let _ = sink.close().await;
                        return SessionEnd::Shutdown;
                    }
                },

                message = source.next_message() => match message {
                    Some(Ok(message)) => {
                        self.shared.state.write().record_message();
                        match message {
                            TransportMessage::Text(text) => {
                                self.shared.dispatcher.dispatch_text(&text);
                            }
                            TransportMessage::Binary(bytes) => {
                                match std::str::from_utf8(&bytes) {
                                    Ok(text) => self.shared.dispatcher.dispatch_text(text),
                                    Err(_) => warn!("Dropping non-UTF-8 binary frame"),
                                }
                            }
                            TransportMessage::Ping(data) => {
                                if let Err(e) = sink.send(TransportMessage::Pong(data)).await {
                                    warn!(error = %e, "Failed to send pong");
                                }
                            }
                            TransportMessage::Pong(_) => {
                                self.shared.state.write().record_pong();
                            }
                            TransportMessage::Close(reason) => {
                                info!(?reason, "Server closed the stream");
                                return SessionEnd::Dropped { error: None };
                            }
                        }
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Stream transport error");
                        return SessionEnd::Dropped { error: Some(e) };
                    }
                    None => {
                        info!("Stream ended");
                        return SessionEnd::Dropped { error: None };
                    }
                },

                _ = heartbeat.tick() => {
                    if self.shared.config.auto_ping {
                        if let Err(e) = sink.send(TransportMessage::ping(Vec::new())).await {
                            warn!(error = %e, "Failed to send ping");
                        }
                    }
                }
            }
        }
    }
}
