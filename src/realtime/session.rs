use super::connection::ConnectionInner;
use super::state::SessionCommand;
use crate::websocket::{Socket, SocketFrame};
use futures::{SinkExt, StreamExt};
use std::sync::Weak;
use tokio::sync::mpsc;

/// Owns one open socket: reads frames until the socket closes or the
/// connection asks it to close, then reports the close event.
pub(crate) struct Session {
    generation: u64,
    connection: Weak<ConnectionInner>,
    socket: Socket,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
}

impl Session {
    pub fn new(
        generation: u64,
        connection: Weak<ConnectionInner>,
        socket: Socket,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
    ) -> Self {
        Self {
            generation,
            connection,
            socket,
            commands,
        }
    }

    pub async fn run(self) {
        let Session {
            generation,
            connection,
            socket: Socket {
                mut sink,
                mut stream,
            },
            mut commands,
        } = self;

        tracing::debug!("Starting socket session {}", generation);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    if command == Some(SessionCommand::Close) {
                        tracing::debug!("Closing socket session {}", generation);
                    }
                    break;
                }
                frame = stream.next() => {
                    let Some(inner) = connection.upgrade() else {
                        break;
                    };
                    let still_current = match frame {
                        Some(Ok(text)) => inner.handle_frame(generation, &text),
                        Some(Err(e)) => inner.handle_transport_error(generation, &e),
                        None => {
                            tracing::debug!("Socket session {} stream ended", generation);
                            false
                        }
                    };
                    if !still_current {
                        break;
                    }
                }
            }
        }

        let _ = sink.send(SocketFrame::Close).await;
        let _ = sink.close().await;

        if let Some(inner) = connection.upgrade() {
            inner.handle_socket_closed(generation);
        }
        tracing::debug!("Socket session {} finished", generation);
    }
}
