// WebSocket module - transport seam for the realtime connection
pub mod factory;
pub mod socket;

#[cfg(test)]
pub(crate) mod memory;

pub use factory::{SocketFactory, TungsteniteSocketFactory};
pub use socket::{Socket, SocketFrame, SocketSink, SocketStream};
