use crate::types::Result;
use futures::{Sink, Stream};
use std::pin::Pin;

/// Outbound frame written to a realtime socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketFrame {
    Text(String),
    Close,
}

pub type SocketSink = Pin<Box<dyn Sink<SocketFrame, Error = crate::RealtimeError> + Send>>;

/// Inbound text frames. An `Err` item is a transport error; the end of the
/// stream is the socket's close event.
pub type SocketStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// An open duplex socket, split into its write and read halves.
pub struct Socket {
    pub sink: SocketSink,
    pub stream: SocketStream,
}

impl Socket {
    pub fn new(sink: SocketSink, stream: SocketStream) -> Self {
        Self { sink, stream }
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket").finish_non_exhaustive()
    }
}
