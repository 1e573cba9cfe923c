use super::listeners::{EventListener, ListenerSet};
use crate::infrastructure::RealtimeHttp;
use crate::types::InboundMessage;
use std::sync::Arc;

/// What the router did with an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Heartbeat,
    Event,
    Ignored,
}

/// Routes inbound frames: heartbeats stay internal, everything else reaches the
/// event listeners, and events carrying an `id` are acknowledged.
pub struct MessageRouter {
    events: Arc<ListenerSet<EventListener>>,
    http: RealtimeHttp,
}

impl MessageRouter {
    pub fn new(events: Arc<ListenerSet<EventListener>>, http: RealtimeHttp) -> Self {
        Self { events, http }
    }

    /// Routes one text frame to the appropriate handler(s)
    pub fn route(&self, text: &str) -> Routed {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("Failed to parse incoming message: {} - Raw: {}", e, text);
                return Routed::Ignored;
            }
        };

        match message {
            InboundMessage::Heartbeat => {
                tracing::debug!("Heartbeat received");
                Routed::Heartbeat
            }
            InboundMessage::Event { ack_id, payload } => {
                self.events.emit(|listener| listener(&payload));

                if let Some(id) = ack_id {
                    self.acknowledge(id);
                }
                Routed::Event
            }
        }
    }

    /// Fire-and-forget acknowledgment; failures are logged and never retried
    fn acknowledge(&self, id: serde_json::Value) {
        let http = self.http.clone();
        tokio::spawn(async move {
            if let Err(e) = http.acknowledge(&id).await {
                tracing::debug!("Failed to acknowledge event {}: {}", id, e);
            }
        });
    }
}
