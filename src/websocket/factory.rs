use super::socket::{Socket, SocketFrame};
use crate::types::{RealtimeError, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::tungstenite::Message;

/// Opens realtime sockets.
///
/// The connection never reaches for a global transport; it is handed a factory
/// at construction time. [`TungsteniteSocketFactory`] is the default.
#[async_trait]
pub trait SocketFactory: Send + Sync + 'static {
    /// Open a socket and complete its handshake
    async fn open(&self, url: &str) -> Result<Socket>;
}

/// WebSocket factory backed by `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteSocketFactory;

#[async_trait]
impl SocketFactory for TungsteniteSocketFactory {
    async fn open(&self, url: &str) -> Result<Socket> {
        tracing::debug!("Creating WebSocket connection to: {}", strip_query(url));

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (write_half, read_half) = ws_stream.split();

        let sink = write_half.with(|frame: SocketFrame| {
            future::ready(Ok::<_, RealtimeError>(match frame {
                SocketFrame::Text(text) => Message::Text(text.into()),
                SocketFrame::Close => Message::Close(None),
            }))
        });

        let stream = read_half.filter_map(|msg_result| {
            future::ready(match msg_result {
                Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                Ok(Message::Close(frame)) => {
                    if let Some(close_frame) = frame {
                        tracing::debug!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason
                        );
                    } else {
                        tracing::debug!("Server closed connection without close frame");
                    }
                    None
                }
                Ok(Message::Ping(data)) => {
                    tracing::trace!("Received ping ({} bytes)", data.len());
                    None
                }
                Ok(Message::Pong(data)) => {
                    tracing::trace!("Received pong ({} bytes)", data.len());
                    None
                }
                Ok(Message::Binary(data)) => {
                    tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
                    None
                }
                Ok(Message::Frame(_)) => None,
                Err(e) => Some(Err(RealtimeError::from(e))),
            })
        });

        Ok(Socket::new(Box::pin(sink), Box::pin(stream)))
    }
}

/// Drop the query string so access tokens never reach the logs
pub(crate) fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
