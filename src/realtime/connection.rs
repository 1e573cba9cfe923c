use super::builder::{RealtimeConnectionBuilder, RealtimeOptions, ResolvedConfig};
use super::session::Session;
use super::state::{ConnectionPhase, ConnectionState, SocketHandle};
use crate::infrastructure::{HeartbeatMonitor, RealtimeHttp, TaskKind, Timer};
use crate::messaging::{
    ConnectionListener, ErrorListener, EventListener, Listeners, MessageRouter, Routed,
    Subscription,
};
use crate::types::{
    CONNECTION_CLOSED_REASON, RealtimeError, Result, StreamMode, SubscribeMessage,
};
use crate::websocket::{Socket, SocketFactory, SocketFrame};
use futures::SinkExt;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// A self-healing subscription to the Kadoa realtime event stream.
///
/// `RealtimeConnection` exchanges the API key for an access token, opens the
/// WebSocket, subscribes to the team channel and then:
/// - forwards every application event to the registered event listeners
/// - acknowledges events that carry an `id`
/// - watches heartbeats and force-closes a silent socket
/// - reconnects after a fixed delay whenever the socket closes
///
/// Listeners survive reconnects. Only [`close()`](Self::close) removes them,
/// and after `close()` the connection never comes back.
///
/// # Example
///
/// ```no_run
/// use kadoa_sdk::{RealtimeConnection, RealtimeOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let realtime = RealtimeConnection::new(RealtimeOptions {
///     api_key: "your-api-key".to_string(),
///     ..Default::default()
/// })?;
///
/// let _events = realtime.on_event(|event| println!("event: {}", event));
/// let _state = realtime.on_connection(|connected, reason| {
///     println!("connected={} reason={:?}", connected, reason);
/// });
///
/// realtime.connect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeConnection {
    inner: Arc<ConnectionInner>,
}

impl RealtimeConnection {
    /// Creates a connection with default endpoints and transport.
    ///
    /// No network activity happens until [`connect()`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Auth`] for an empty API key and
    /// [`RealtimeError::Config`] for a zero interval, delay or limit.
    pub fn new(options: RealtimeOptions) -> Result<Self> {
        RealtimeConnectionBuilder::new(options).map(|builder| builder.build())
    }

    /// Starts a builder for custom endpoints, transports or HTTP clients
    pub fn builder(options: RealtimeOptions) -> Result<RealtimeConnectionBuilder> {
        RealtimeConnectionBuilder::new(options)
    }

    pub(crate) fn from_parts(
        config: ResolvedConfig,
        http: RealtimeHttp,
        socket_factory: Arc<dyn SocketFactory>,
    ) -> Self {
        let listeners = Listeners::new();
        let router = MessageRouter::new(Arc::clone(&listeners.events), http.clone());

        Self {
            inner: Arc::new(ConnectionInner {
                config,
                http,
                socket_factory,
                state: Mutex::new(ConnectionState::new()),
                listeners,
                router,
            }),
        }
    }

    /// Establishes the realtime subscription.
    ///
    /// Safe to call repeatedly: while an attempt is in flight, or a socket is
    /// already open, this returns immediately. It never fails. A failed
    /// attempt is retried automatically after the reconnect delay; socket
    /// errors are reported through [`on_error()`](Self::on_error) and state
    /// changes through [`on_connection()`](Self::on_connection).
    pub async fn connect(&self) {
        self.inner.connect().await;
    }

    /// Registers a listener for application events. Heartbeats never reach it.
    ///
    /// Every call registers a new listener, even for the same closure or `fn`.
    /// Use [`on_event_shared()`](Self::on_event_shared) to register a callback
    /// that must fire once per event however often it is registered.
    pub fn on_event<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_event_shared(Arc::new(listener))
    }

    /// Registers a shared event listener. Registering the same `Arc` again
    /// keeps the single existing entry.
    pub fn on_event_shared(&self, listener: Arc<EventListener>) -> Subscription {
        self.inner.listeners.events.insert(listener)
    }

    /// Registers a listener for connection state changes.
    ///
    /// Called with `(true, None)` whenever a subscription becomes active and
    /// `(false, Some("Connection closed"))` whenever the socket closes.
    pub fn on_connection<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool, Option<&str>) + Send + Sync + 'static,
    {
        self.on_connection_shared(Arc::new(listener))
    }

    /// Registers a shared connection listener, deduplicated by `Arc` identity
    pub fn on_connection_shared(&self, listener: Arc<ConnectionListener>) -> Subscription {
        self.inner.listeners.connection.insert(listener)
    }

    /// Registers a listener for transport errors.
    ///
    /// Errors are informational: they neither stop the connection nor trigger
    /// a reconnect by themselves.
    pub fn on_error<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RealtimeError) + Send + Sync + 'static,
    {
        self.on_error_shared(Arc::new(listener))
    }

    /// Registers a shared error listener, deduplicated by `Arc` identity
    pub fn on_error_shared(&self, listener: Arc<ErrorListener>) -> Subscription {
        self.inner.listeners.errors.insert(listener)
    }

    /// Permanently shuts the connection down.
    ///
    /// Cancels the heartbeat check and any pending reconnect, closes the
    /// socket and removes every listener. Idempotent, and safe to call from
    /// inside a listener.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Whether a socket exists and is open
    pub fn is_connected(&self) -> bool {
        self.inner.state().is_socket_open()
    }

    pub fn state(&self) -> ConnectionPhase {
        self.inner.state().phase()
    }

    /// When the last heartbeat arrived (or when the connection was created
    /// or last opened, whichever is later)
    pub fn last_heartbeat_at(&self) -> Instant {
        self.inner.state().last_heartbeat_at
    }

    pub fn stream_mode(&self) -> StreamMode {
        self.inner.config.stream_mode
    }

    #[cfg(test)]
    pub(crate) fn heartbeat_check_active(&self) -> bool {
        self.inner.state().heartbeat_check_active()
    }

    #[cfg(test)]
    pub(crate) fn reconnect_pending(&self) -> bool {
        self.inner.state().tasks.is_running(TaskKind::Reconnect)
    }
}

impl std::fmt::Debug for RealtimeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConnection")
            .field("phase", &self.state())
            .field("stream_mode", &self.stream_mode())
            .finish()
    }
}

/// Why a connect attempt failed
enum AttemptError {
    /// Token exchange or URI construction; retried silently
    BeforeSocket(RealtimeError),
    /// Handshake or subscribe failure; reported and handled like a close
    Socket(RealtimeError),
}

pub(crate) struct ConnectionInner {
    config: ResolvedConfig,
    http: RealtimeHttp,
    socket_factory: Arc<dyn SocketFactory>,
    state: Mutex<ConnectionState>,
    listeners: Listeners,
    router: MessageRouter,
}

impl ConnectionInner {
    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_attempt(&self) -> Option<u64> {
        self.state().begin_attempt()
    }

    fn owns(&self, generation: u64) -> bool {
        self.state().owns(generation)
    }

    async fn connect(self: &Arc<Self>) {
        let Some(generation) = self.begin_attempt() else {
            tracing::debug!("Connect skipped: attempt in flight, socket present or closed");
            return;
        };

        tracing::info!("Connecting to realtime (attempt {})", generation);

        match self.establish(generation).await {
            Ok(()) => {}
            Err(AttemptError::BeforeSocket(e)) => {
                tracing::warn!("Failed to connect: {}", e);
                self.retry_later(generation);
            }
            Err(AttemptError::Socket(e)) => {
                tracing::warn!("Failed to open realtime socket: {}", e);
                if self.owns(generation) {
                    self.listeners.notify_error(&e);
                }
                self.handle_socket_closed(generation);
            }
        }
    }

    async fn establish(self: &Arc<Self>, generation: u64) -> std::result::Result<(), AttemptError> {
        let grant = self
            .http
            .exchange_token(&self.config.api_key)
            .await
            .map_err(AttemptError::BeforeSocket)?;

        if !self.owns(generation) {
            tracing::debug!("Connection closed during token exchange, abandoning attempt");
            return Ok(());
        }

        let mode = self.config.stream_mode;
        let url = self
            .http
            .endpoints()
            .socket_url(mode, &grant.access_token)
            .map_err(AttemptError::BeforeSocket)?;

        let Socket {
            mut sink,
            stream,
        } = self
            .socket_factory
            .open(&url)
            .await
            .map_err(AttemptError::Socket)?;

        if !self.owns(generation) {
            tracing::debug!("Connection closed during handshake, dropping socket");
            let _ = sink.close().await;
            return Ok(());
        }

        let subscribe = serde_json::to_string(&SubscribeMessage::new(&grant.team_id, mode))
            .map_err(|e| AttemptError::Socket(e.into()))?;
        sink.send(SocketFrame::Text(subscribe))
            .await
            .map_err(AttemptError::Socket)?;

        let commands = {
            let mut state = self.state();
            if !state.owns(generation) {
                None
            } else {
                let (handle, commands) = SocketHandle::new(generation);
                state.socket = Some(handle);
                state.is_connecting = false;
                state.last_heartbeat_at = Instant::now();
                state.tasks.spawn(
                    TaskKind::Heartbeat,
                    HeartbeatMonitor::new(
                        Arc::downgrade(self),
                        generation,
                        self.config.heartbeat_interval,
                        self.config.missed_heartbeat_limit,
                    )
                    .run(),
                );
                Some(commands)
            }
        };

        let Some(commands) = commands else {
            tracing::debug!("Connection closed while subscribing, dropping socket");
            let _ = sink.close().await;
            return Ok(());
        };

        tracing::info!("Connected to realtime channel {}", grant.team_id);
        self.listeners.notify_connection(true, None);

        let session = Session::new(
            generation,
            Arc::downgrade(self),
            Socket::new(sink, stream),
            commands,
        );
        self.state().tasks.spawn(TaskKind::Session, session.run());

        Ok(())
    }

    /// Schedule the next attempt after a failure that never produced a socket
    fn retry_later(self: &Arc<Self>, generation: u64) {
        let mut state = self.state();
        if !state.owns(generation) {
            return;
        }
        state.is_connecting = false;
        self.schedule_reconnect(&mut state);
    }

    fn schedule_reconnect(self: &Arc<Self>, state: &mut ConnectionState) {
        let timer = Timer::new(self.config.reconnect_delay);
        tracing::info!("Reconnecting in {}ms", timer.delay().as_millis());

        let weak = Arc::downgrade(self);
        state.tasks.spawn(
            TaskKind::Reconnect,
            timer.schedule(move || async move {
                if let Some(inner) = weak.upgrade() {
                    // Run the attempt outside the timer task: a failed attempt
                    // replaces the timer, which must not abort its own caller.
                    tokio::spawn(async move { inner.connect().await });
                }
            }),
        );
    }

    /// Route one inbound frame. Returns `false` once the session is stale.
    pub(crate) fn handle_frame(&self, generation: u64, text: &str) -> bool {
        if !self.owns(generation) {
            return false;
        }

        if self.router.route(text) == Routed::Heartbeat {
            let mut state = self.state();
            if state.owns(generation) {
                state.record_heartbeat();
            }
        }
        true
    }

    /// Report a transport error. Returns `false` once the session is stale.
    pub(crate) fn handle_transport_error(&self, generation: u64, error: &RealtimeError) -> bool {
        if !self.owns(generation) {
            return false;
        }
        tracing::warn!("WebSocket error: {}", error);
        self.listeners.notify_error(error);
        true
    }

    /// The socket of `generation` closed: tear the session down and schedule
    /// the reconnect. The only path that reconnects a previously open socket.
    pub(crate) fn handle_socket_closed(self: &Arc<Self>, generation: u64) {
        {
            let mut state = self.state();
            if !state.owns(generation) {
                return;
            }
            state.tasks.abort(TaskKind::Heartbeat);
            state.tasks.detach(TaskKind::Session);
            state.socket = None;
            state.is_connecting = false;
            self.schedule_reconnect(&mut state);
        }

        tracing::info!("WebSocket disconnected");
        self.listeners
            .notify_connection(false, Some(CONNECTION_CLOSED_REASON));
    }

    /// Heartbeat timestamp for a live session of `generation`
    pub(crate) fn last_heartbeat_for(&self, generation: u64) -> Option<Instant> {
        let state = self.state();
        let live = state.owns(generation)
            && state
                .socket
                .as_ref()
                .is_some_and(|socket| socket.generation == generation);
        live.then_some(state.last_heartbeat_at)
    }

    /// Force-close the socket of `generation`; its close event follows
    pub(crate) fn request_socket_close(&self, generation: u64) {
        let mut state = self.state();
        if let Some(socket) = state
            .socket
            .as_mut()
            .filter(|socket| socket.generation == generation)
        {
            socket.request_close();
        }
    }

    fn close(&self) {
        let socket = {
            let mut state = self.state();
            if !state.disposed {
                tracing::info!("Closing realtime connection");
            }
            state.disposed = true;
            state.is_connecting = false;
            state.tasks.abort(TaskKind::Heartbeat);
            state.tasks.abort(TaskKind::Reconnect);
            state.tasks.detach(TaskKind::Session);
            state.socket.take()
        };

        if let Some(mut socket) = socket {
            socket.request_close();
        }

        self.listeners.clear();
    }
}
