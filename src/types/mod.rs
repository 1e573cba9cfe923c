pub mod constants;
pub mod endpoints;
pub mod error;
pub mod message;

pub use constants::*;
pub use endpoints::Endpoints;
pub use error::{ErrorCode, PollingError, RealtimeError, Result};
pub use message::{InboundMessage, StreamMode, SubscribeMessage, TokenGrant};
