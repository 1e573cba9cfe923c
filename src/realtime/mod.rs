// Realtime module - WebSocket event subscription with heartbeat and reconnect
mod builder;
mod connection;
mod session;
mod state;


pub(crate) use connection::ConnectionInner;

pub use builder::{RealtimeConnectionBuilder, RealtimeOptions};
pub use connection::RealtimeConnection;
pub use state::ConnectionPhase;
