// Messaging module - Listener registries and inbound message routing
pub mod listeners;
pub mod router;

pub use listeners::{
    ConnectionListener, ErrorListener, EventListener, ListenerSet, Listeners, Subscription,
};
pub use router::{MessageRouter, Routed};
