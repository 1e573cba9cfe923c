//! In-memory sockets for exercising the connection without a network.

use super::factory::SocketFactory;
use super::socket::{Socket, SocketFrame};
use crate::types::{RealtimeError, Result};
use async_trait::async_trait;
use futures::SinkExt;
use futures::channel::mpsc as fmpsc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Server side of an in-memory socket
pub(crate) struct MemoryPeer {
    pub url: String,
    outbound: fmpsc::UnboundedReceiver<SocketFrame>,
    inbound: Option<fmpsc::UnboundedSender<Result<String>>>,
}

impl MemoryPeer {
    pub fn send_text(&self, text: impl Into<String>) {
        if let Some(inbound) = &self.inbound {
            let _ = inbound.unbounded_send(Ok(text.into()));
        }
    }

    pub fn send_json(&self, value: serde_json::Value) {
        self.send_text(value.to_string());
    }

    pub fn send_error(&self, message: &str) {
        if let Some(inbound) = &self.inbound {
            let _ = inbound.unbounded_send(Err(RealtimeError::Connection(message.to_string())));
        }
    }

    /// Ends the client's read stream, which the client sees as a close event
    pub fn disconnect(&mut self) {
        self.inbound = None;
    }

    /// Next frame written by the client
    pub async fn next_frame(&mut self) -> Option<SocketFrame> {
        use futures::StreamExt;
        tokio::time::timeout(Duration::from_secs(2), self.outbound.next())
            .await
            .ok()
            .flatten()
    }
}

/// Hands out connected in-memory socket pairs and records every open
pub(crate) struct MemorySocketFactory {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    failures: AtomicUsize,
    opened: Mutex<Vec<String>>,
}

impl MemorySocketFactory {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers, peer_rx) = mpsc::unbounded_channel();
        let factory = Self {
            peers,
            failures: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
        };
        (factory, peer_rx)
    }

    /// Make the next `count` opens fail
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

#[async_trait]
impl SocketFactory for MemorySocketFactory {
    async fn open(&self, url: &str) -> Result<Socket> {
        self.opened.lock().unwrap().push(url.to_string());

        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RealtimeError::Connection("handshake refused".to_string()));
        }

        let (out_tx, out_rx) = fmpsc::unbounded();
        let (in_tx, in_rx) = fmpsc::unbounded();

        let peer = MemoryPeer {
            url: url.to_string(),
            outbound: out_rx,
            inbound: Some(in_tx),
        };
        self.peers
            .send(peer)
            .map_err(|_| RealtimeError::Connection("test harness dropped".to_string()))?;

        let sink = out_tx.sink_map_err(|e| RealtimeError::Connection(e.to_string()));
        Ok(Socket::new(Box::pin(sink), Box::pin(in_rx)))
    }
}
