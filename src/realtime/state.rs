use crate::infrastructure::{TaskKind, TaskManager};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Transport-level state of the current socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Open,
    Closing,
}

/// Observable lifecycle phase of a realtime connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No socket and no attempt in flight (never connected, or waiting to retry)
    Idle,
    /// Token exchange or socket handshake in progress
    Connecting,
    /// Socket open and subscribed
    Open,
    /// Socket asked to close, close event pending
    Closing,
    /// `close()` was called; terminal
    Disposed,
}

/// Instructions from the connection to its socket session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionCommand {
    Close,
}

/// The connection's view of its current socket
#[derive(Debug)]
pub(crate) struct SocketHandle {
    pub generation: u64,
    pub ready_state: ReadyState,
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SocketHandle {
    pub fn new(generation: u64) -> (Self, mpsc::UnboundedReceiver<SessionCommand>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let handle = Self {
            generation,
            ready_state: ReadyState::Open,
            commands,
        };
        (handle, command_rx)
    }

    /// Ask the session to close the socket; the session reports the close event
    pub fn request_close(&mut self) {
        self.ready_state = ReadyState::Closing;
        let _ = self.commands.send(SessionCommand::Close);
    }
}

/// Consolidated mutable state for a RealtimeConnection.
///
/// Every attempt to connect gets a new generation number. Callbacks coming
/// from a socket or timer of an older generation, or arriving after disposal,
/// are dropped.
#[derive(Debug)]
pub(crate) struct ConnectionState {
    pub socket: Option<SocketHandle>,
    pub is_connecting: bool,
    pub last_heartbeat_at: Instant,
    pub tasks: TaskManager,
    pub generation: u64,
    pub disposed: bool,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            socket: None,
            is_connecting: false,
            last_heartbeat_at: Instant::now(),
            tasks: TaskManager::new(),
            generation: 0,
            disposed: false,
        }
    }

    /// Start a new attempt unless one is in flight, a socket exists, or the
    /// connection is disposed. Returns the attempt's generation.
    pub fn begin_attempt(&mut self) -> Option<u64> {
        if self.disposed || self.is_connecting || self.socket.is_some() {
            return None;
        }

        self.tasks.abort(TaskKind::Reconnect);
        self.generation += 1;
        self.is_connecting = true;
        Some(self.generation)
    }

    /// Whether `generation` is the live attempt or the live socket
    pub fn owns(&self, generation: u64) -> bool {
        !self.disposed
            && self.generation == generation
            && (self.is_connecting || self.socket.is_some())
    }

    pub fn record_heartbeat(&mut self) {
        self.last_heartbeat_at = self.last_heartbeat_at.max(Instant::now());
    }

    pub fn is_socket_open(&self) -> bool {
        self.socket
            .as_ref()
            .is_some_and(|socket| socket.ready_state == ReadyState::Open)
    }

    pub fn heartbeat_check_active(&self) -> bool {
        self.tasks.is_running(TaskKind::Heartbeat)
    }

    pub fn phase(&self) -> ConnectionPhase {
        if self.disposed {
            return ConnectionPhase::Disposed;
        }
        match &self.socket {
            Some(socket) if socket.ready_state == ReadyState::Open => ConnectionPhase::Open,
            Some(_) => ConnectionPhase::Closing,
            None if self.is_connecting => ConnectionPhase::Connecting,
            None => ConnectionPhase::Idle,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_attempt_is_exclusive() {
        let mut state = ConnectionState::new();
        assert_eq!(state.begin_attempt(), Some(1));
        assert_eq!(state.begin_attempt(), None);
        assert_eq!(state.phase(), ConnectionPhase::Connecting);

        state.is_connecting = false;
        assert_eq!(state.begin_attempt(), Some(2));
    }

    #[test]
    fn test_no_attempt_while_socket_present_or_disposed() {
        let mut state = ConnectionState::new();
        let (socket, _rx) = SocketHandle::new(1);
        state.socket = Some(socket);
        assert_eq!(state.begin_attempt(), None);

        state.socket = None;
        state.disposed = true;
        assert_eq!(state.begin_attempt(), None);
        assert_eq!(state.phase(), ConnectionPhase::Disposed);
    }

    #[test]
    fn test_stale_generation_is_not_owned() {
        let mut state = ConnectionState::new();
        let first = state.begin_attempt().unwrap();
        assert!(state.owns(first));

        state.is_connecting = false;
        let second = state.begin_attempt().unwrap();
        assert!(!state.owns(first));
        assert!(state.owns(second));

        state.disposed = true;
        assert!(!state.owns(second));
    }

    #[tokio::test]
    async fn test_request_close_marks_closing() {
        let (mut socket, mut rx) = SocketHandle::new(3);
        socket.request_close();
        assert_eq!(socket.ready_state, ReadyState::Closing);
        assert_eq!(rx.recv().await, Some(SessionCommand::Close));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_only_moves_forward() {
        let mut state = ConnectionState::new();
        let before = state.last_heartbeat_at;
        tokio::time::advance(std::time::Duration::from_millis(10)).await;
        state.record_heartbeat();
        assert!(state.last_heartbeat_at > before);
    }
}
